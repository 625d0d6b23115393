//! Top-level DNS request handler: routes supported A/AAAA queries to the
//! registry and everything else to the forwarder.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::proto::op::{Header, MessageType, OpCode, ResponseCode};
use hickory_server::proto::rr::{Name, RData, Record, RecordType};
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use tracing::{debug, trace, warn};

use dnswall_core::Registry;

use super::answer::build_answers;
use super::error::DnsError;
use super::forwarder::Forwarder;

/// Upper bound on how long a single registry lookup may take before the
/// query is abandoned and the forwarder is tried instead.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

const ANSWER_TTL: u32 = 60;

pub struct DnsHandler {
    registry: Arc<Registry>,
    forwarder: Arc<Forwarder>,
}

impl DnsHandler {
    pub fn new(registry: Arc<Registry>, forwarder: Arc<Forwarder>) -> Self {
        Self { registry, forwarder }
    }

    /// Resolves one query, trying the registry first (when it claims the
    /// name and the record type is A/AAAA) and falling back to the
    /// forwarder. Registry lookups run as an independent task so one slow
    /// KV read never blocks other in-flight queries.
    async fn resolve_query(&self, qname: &Name, qtype: RecordType) -> Vec<Record> {
        let plain_name = qname.to_string().trim_end_matches('.').to_string();

        if matches!(qtype, RecordType::A | RecordType::AAAA) && self.registry.supports(&plain_name) {
            let registry = Arc::clone(&self.registry);
            let name_for_lookup = plain_name.clone();
            let lookup_task = tokio::spawn(async move { registry.lookup(&name_for_lookup).await });

            match tokio::time::timeout(LOOKUP_TIMEOUT, lookup_task).await {
                Ok(Ok(Ok(detail))) => {
                    return build_answers(qname, qtype, &detail, ANSWER_TTL);
                }
                Ok(Ok(Err(err))) => {
                    warn!(name = %plain_name, %err, "registry lookup failed, forwarding");
                }
                Ok(Err(join_err)) => {
                    warn!(name = %plain_name, %join_err, "registry lookup task panicked, forwarding");
                }
                Err(_) => {
                    warn!(name = %plain_name, "registry lookup timed out, forwarding");
                }
            }
        } else {
            trace!(name = %plain_name, ?qtype, "query not handled by registry, forwarding");
        }

        self.forwarder
            .resolve(qname.to_string().trim_end_matches('.'), qtype)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(|rdata| record_from_rdata(qname, &rdata))
            .collect()
    }

    async fn handle_request_inner<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> Result<ResponseInfo, DnsError> {
        debug!(
            src = %request.src(),
            op_code = ?request.op_code(),
            message_type = ?request.message_type(),
            "received DNS request"
        );

        if request.op_code() != OpCode::Query {
            return Err(DnsError::InvalidOpCode(request.op_code()));
        }

        if request.message_type() != MessageType::Query {
            return Err(DnsError::InvalidMessageType(request.message_type()));
        }

        let builder = MessageResponseBuilder::from_message_request(request);
        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(false);

        let mut answers = Vec::new();
        for query in request.queries() {
            let qname = match Name::from_str(&query.name().to_string()) {
                Ok(name) => name,
                Err(_) => continue,
            };
            answers.extend(self.resolve_query(&qname, query.query_type()).await);
        }

        let response = builder.build(header, answers.iter(), &[], &[], &[]);
        Ok(response_handle.send_response(response).await?)
    }
}

fn record_from_rdata(name: &Name, rdata: &RData) -> Record {
    Record::from_rdata(name.clone(), ANSWER_TTL, rdata.clone())
}

#[async_trait]
impl RequestHandler for DnsHandler {
    async fn handle_request<R: ResponseHandler>(&self, request: &Request, response: R) -> ResponseInfo
    where
        R: ResponseHandler + Send,
    {
        match self.handle_request_inner(request, response).await {
            Ok(info) => info,
            Err(err) => {
                warn!(%err, "failed to handle DNS request");
                let mut header = Header::new();
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}
