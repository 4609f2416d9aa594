//! HTTP implementation of the remote ticket service.

use checkin_core::error::CheckInError;
use checkin_core::remote::{
    EventDetail, EventSummary, RemoteCall, RemoteFuture, RemoteReply, RemoteTicketService,
};
use checkin_core::types::EventId;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default authenticated API root
pub const DEFAULT_API_BASE_URL: &str = "https://new-api.worldeventaccess.com/api";

/// Default public catalog API root
pub const DEFAULT_PUBLIC_API_BASE_URL: &str = "https://api.worldeventaccess.com/api";

/// Connection settings for [`HttpTicketService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    /// Root of the authenticated API (tickets, seating, event detail)
    pub api_base_url: String,
    /// Root of the public event catalog
    pub public_api_base_url: String,
    /// Bearer token; no `Authorization` header when `None`
    pub api_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            public_api_base_url: DEFAULT_PUBLIC_API_BASE_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Remote ticket service over HTTP
#[derive(Debug, Clone)]
pub struct HttpTicketService {
    client: Client,
    settings: HttpSettings,
}

impl HttpTicketService {
    /// Create a client with the given settings
    ///
    /// # Errors
    ///
    /// Returns [`CheckInError::Transport`] when the HTTP client cannot be built.
    pub fn new(settings: HttpSettings) -> Result<Self, CheckInError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| CheckInError::Transport(e.to_string()))?;
        Ok(Self { client, settings })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{path}", self.settings.api_base_url.trim_end_matches('/'))
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{path}",
            self.settings.public_api_base_url.trim_end_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.settings.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn into_reply(response: Response) -> Result<RemoteReply, CheckInError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| CheckInError::Transport(e.to_string()))?;
        Ok(RemoteReply::new(status, text))
    }

    async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, CheckInError> {
        let response = request
            .send()
            .await
            .map_err(|e| CheckInError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CheckInError::RemoteRejection {
                status: status.as_u16(),
                reason: body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| CheckInError::MalformedPayload(e.to_string()))
    }

    fn request_for(&self, call: &RemoteCall) -> RequestBuilder {
        match call {
            RemoteCall::RedeemPassCode(body) => self
                .authorized(self.client.post(self.api_url("PublicEvents/PassCode")))
                .json(body),
            RemoteCall::UpdateTicket(body) => self
                .authorized(self.client.put(self.api_url("Ticket")))
                .json(body),
            RemoteCall::UpdateParking(body) => self
                .authorized(self.client.put(self.api_url("Ticket/Parking")))
                .json(body),
            RemoteCall::AssignChair(body) => self
                .client
                .post(self.api_url("PublicTicket/AssignChairToTicket"))
                .json(body),
            RemoteCall::ReleaseChair(body) => self
                .client
                .post(self.api_url("PublicTicket/ReleaseChairFromTicket"))
                .json(body),
        }
    }
}

impl RemoteTicketService for HttpTicketService {
    fn list_events(&self) -> RemoteFuture<'_, Vec<EventSummary>> {
        let request = self
            .client
            .get(self.public_url("PublicEvents"))
            .query(&[("Status", "1")]);
        Box::pin(Self::fetch_json(request))
    }

    fn event_detail(&self, event_id: &EventId) -> RemoteFuture<'_, EventDetail> {
        let request = self
            .authorized(self.client.get(self.api_url(&format!("Event/{event_id}"))))
            .query(&[("IncludeTickets", "false")]);
        Box::pin(Self::fetch_json(request))
    }

    fn send(&self, call: &RemoteCall) -> RemoteFuture<'_, RemoteReply> {
        let request = self.request_for(call);
        let name = call.name();
        Box::pin(async move {
            let response = request.send().await.map_err(|e| {
                tracing::warn!(call = name, error = %e, "Remote call did not complete");
                CheckInError::Transport(e.to_string())
            })?;
            let reply = Self::into_reply(response).await?;
            tracing::debug!(call = name, status = reply.status, "Remote call replied");
            Ok(reply)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use checkin_core::remote::{ParkingUpdateRequest, PassCodeRequest, SeatingRequest};
    use checkin_core::types::{ChairId, TableId, TicketId};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer, token: Option<&str>) -> HttpTicketService {
        HttpTicketService::new(HttpSettings {
            api_base_url: server.uri(),
            public_api_base_url: format!("{}/public/", server.uri()),
            api_token: token.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn event_id() -> EventId {
        EventId::parse("E1").unwrap()
    }

    #[tokio::test]
    async fn redeem_posts_pass_code_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/PublicEvents/PassCode"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_json(json!({ "passCode": "1234", "eventId": "E1", "name": "Grace" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "eventTickets": [{ "id": "t1" }] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = service(&server, Some("secret"))
            .send(&RemoteCall::RedeemPassCode(PassCodeRequest {
                pass_code: "1234".into(),
                event_id: event_id(),
                name: "Grace".into(),
            }))
            .await
            .unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["eventTickets"][0]["id"], "t1");
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/Ticket/Parking"))
            .respond_with(ResponseTemplate::new(400).set_body_string("duplicate"))
            .mount(&server)
            .await;

        let reply = service(&server, None)
            .send(&RemoteCall::UpdateParking(ParkingUpdateRequest {
                id: TicketId::new("t1"),
                parking_slot: Some("P1".into()),
                key_slot: None,
            }))
            .await
            .unwrap();
        assert_eq!(reply.status, 400);
        assert_eq!(reply.text, "duplicate");
    }

    #[tokio::test]
    async fn release_body_carries_no_occupant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/PublicTicket/ReleaseChairFromTicket"))
            .and(body_json(json!({
                "eventId": "E1",
                "passCode": "1234",
                "tables": [{ "tableId": "T1", "chairs": [{ "chairId": "C1" }] }]
            })))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(json!({ "message": "Chair released Successfully" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = service(&server, None)
            .send(&RemoteCall::ReleaseChair(SeatingRequest::release(
                event_id(),
                "1234".into(),
                TableId::new("T1"),
                ChairId::new("C1"),
            )))
            .await
            .unwrap();
        assert_eq!(reply.message(), Some("Chair released Successfully"));
    }

    #[tokio::test]
    async fn catalog_and_detail_use_their_own_roots() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/public/PublicEvents"))
            .and(query_param("Status", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 5, "name": "Gala", "organizerEmail": "o@example.com" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Event/E1"))
            .and(query_param("IncludeTickets", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "Gala",
                "tablesAndChairs": "[]"
            })))
            .mount(&server)
            .await;

        let service = service(&server, Some("secret"));
        let events = service.list_events().await.unwrap();
        assert_eq!(events[0].id, "5");

        let detail = service.event_detail(&event_id()).await.unwrap();
        assert_eq!(detail.tables_and_chairs, Some(json!("[]")));
    }

    #[tokio::test]
    async fn detail_failure_is_a_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Event/E1"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let err = service(&server, None)
            .event_detail(&event_id())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CheckInError::RemoteRejection {
                status: 404,
                reason: "missing".into()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let service = HttpTicketService::new(HttpSettings {
            api_base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(500),
            ..HttpSettings::default()
        })
        .unwrap();
        let err = service
            .send(&RemoteCall::AssignChair(SeatingRequest::assign(
                event_id(),
                "1234".into(),
                TableId::new("T1"),
                ChairId::new("C1"),
                TicketId::new("t1"),
            )))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckInError::Transport(_)));
    }
}
