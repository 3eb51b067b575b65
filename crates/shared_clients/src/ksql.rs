use crate::error::KsqlClientError;
use crate::models::{
    CommandResultItem, DescribeResultItem, ExplainResultItem, KsqlErrorBody, KsqlRequest,
    KsqlResponse, StatusResponse,
};
use async_trait::async_trait;
use common::config::KsqlServerConfig;
use reqwest::header::{ACCEPT, CONTENT_TYPE as CONTENT_TYPE_HEADER};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

pub const CONTENT_TYPE: &str = "application/vnd.ksql.v1+json";

/// Error code ksqlDB uses for a missing stream, table or query.
pub const ERROR_CODE_NOT_FOUND: i64 = 40001;

/// The calls the reconciler makes against a ksqlDB server.
///
/// Every call resolves to either the success payload or the structured error
/// body the server returned; `Err` is reserved for transport failures.
#[async_trait]
pub trait KsqlApi: Send + Sync {
    async fn describe(
        &self,
        name: &str,
    ) -> Result<KsqlResponse<Vec<DescribeResultItem>>, KsqlClientError>;

    async fn explain(
        &self,
        query_id: &str,
    ) -> Result<KsqlResponse<Vec<ExplainResultItem>>, KsqlClientError>;

    /// Runs arbitrary statement text, returning the untyped result array.
    async fn execute(&self, ksql: &str) -> Result<KsqlResponse<Value>, KsqlClientError>;

    async fn create_drop_terminate(
        &self,
        ksql: &str,
    ) -> Result<KsqlResponse<Vec<CommandResultItem>>, KsqlClientError>;

    /// A missing command id yields an error body with code 404.
    async fn status(
        &self,
        command_id: &str,
    ) -> Result<KsqlResponse<StatusResponse>, KsqlClientError>;
}

#[derive(Debug, Clone)]
pub struct KsqlClient {
    base: Url,
    credentials: Option<(String, String)>,
    http: Client,
}

impl KsqlClient {
    pub fn new(base_url: &str) -> Result<Self, KsqlClientError> {
        let base = Url::parse(base_url)
            .map_err(|e| KsqlClientError::invalid_url(format!("'{base_url}': {e}")))?;
        Ok(Self {
            base,
            credentials: None,
            http: Client::new(),
        })
    }

    /// Basic auth is only sent when `username` is non-empty.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials =
            (!username.is_empty()).then(|| (username.to_string(), password.to_string()));
        self
    }

    pub fn from_config(cfg: &KsqlServerConfig) -> Result<Self, KsqlClientError> {
        let client = Self::new(&cfg.url)?;
        Ok(match cfg.credentials() {
            Some((user, pass)) => client.with_credentials(user, pass),
            None => client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, KsqlClientError> {
        self.base
            .join(path)
            .map_err(|e| KsqlClientError::invalid_url(format!("{}{path}: {e}", self.base)))
    }

    fn authorise(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((user, pass)) => req.basic_auth(user, Some(pass)),
            None => req,
        }
    }

    /// Posts `ksql` and decodes a 200 body as `T`, a 400 body as the error
    /// shape.
    pub async fn execute_as<T: DeserializeOwned>(
        &self,
        ksql: &str,
    ) -> Result<KsqlResponse<T>, KsqlClientError> {
        let url = self.endpoint("ksql")?;
        let body = serde_json::to_vec(&KsqlRequest::new(ksql))?;
        debug!(%url, ksql, "posting ksql statement");

        let resp = self
            .authorise(self.http.post(url))
            .header(CONTENT_TYPE_HEADER, CONTENT_TYPE)
            .header(ACCEPT, CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        match status {
            StatusCode::OK => decode(&text).map(KsqlResponse::Success),
            StatusCode::BAD_REQUEST => decode(&text).map(KsqlResponse::Error),
            other => Err(KsqlClientError::unexpected_status(other.as_u16(), text)),
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, KsqlClientError> {
    serde_json::from_str(body)
        .map_err(|e| KsqlClientError::deserialize(format!("{e}, body: '{body}'")))
}

#[async_trait]
impl KsqlApi for KsqlClient {
    async fn describe(
        &self,
        name: &str,
    ) -> Result<KsqlResponse<Vec<DescribeResultItem>>, KsqlClientError> {
        self.execute_as(&format!("DESCRIBE {name};")).await
    }

    async fn explain(
        &self,
        query_id: &str,
    ) -> Result<KsqlResponse<Vec<ExplainResultItem>>, KsqlClientError> {
        self.execute_as(&format!("EXPLAIN {query_id};")).await
    }

    async fn execute(&self, ksql: &str) -> Result<KsqlResponse<Value>, KsqlClientError> {
        self.execute_as(ksql).await
    }

    async fn create_drop_terminate(
        &self,
        ksql: &str,
    ) -> Result<KsqlResponse<Vec<CommandResultItem>>, KsqlClientError> {
        self.execute_as(ksql).await
    }

    async fn status(
        &self,
        command_id: &str,
    ) -> Result<KsqlResponse<StatusResponse>, KsqlClientError> {
        let url = self.endpoint(&format!("status/{command_id}"))?;
        debug!(%url, "fetching command status");

        let resp = self.authorise(self.http.get(url)).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        match status {
            StatusCode::OK => decode(&text).map(KsqlResponse::Success),
            StatusCode::NOT_FOUND => Ok(KsqlResponse::Error(KsqlErrorBody::new(
                404,
                format!("command {command_id} not found"),
            ))),
            other => Err(KsqlClientError::unexpected_status(other.as_u16(), text)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn describe_decodes_source_description() -> Result<(), KsqlClientError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ksql"))
            .and(header("content-type", CONTENT_TYPE))
            .and(body_string_contains("DESCRIBE SESSION_ACTIONS_ST;"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "@type": "sourceDescription",
                "statementText": "DESCRIBE SESSION_ACTIONS_ST;",
                "sourceDescription": {
                    "name": "SESSION_ACTIONS_ST",
                    "readQueries": [],
                    "writeQueries": [{"id": "CSAS_SESSION_ACTIONS_ST_3"}],
                    "type": "STREAM",
                    "statement": "CREATE STREAM SESSION_ACTIONS_ST (A STRING);"
                }
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let client = KsqlClient::new(&server.uri())?;
        let KsqlResponse::Success(items) = client.describe("SESSION_ACTIONS_ST").await? else {
            panic!("expected success");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].source_description.statement,
            "CREATE STREAM SESSION_ACTIONS_ST (A STRING);"
        );
        Ok(())
    }

    #[tokio::test]
    async fn bad_request_is_a_structured_error() -> Result<(), KsqlClientError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ksql"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "@type": "statement_error",
                "error_code": 40001,
                "message": "SESSION_ACTIONS_ST does not exist.",
                "stackTrace": []
            })))
            .mount(&server)
            .await;

        let client = KsqlClient::new(&server.uri())?;
        let resp = client.describe("SESSION_ACTIONS_ST").await?;
        assert!(resp.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn create_reports_command_and_query_ids() -> Result<(), KsqlClientError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ksql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "@type": "currentStatus",
                "statementText": "CREATE STREAM T AS SELECT * FROM S EMIT CHANGES;",
                "commandId": "stream/`T`/create",
                "commandStatus": {
                    "status": "SUCCESS",
                    "message": "Created query with ID CSAS_T_0",
                    "queryId": "CSAS_T_0"
                },
                "commandSequenceNumber": 2
            }])))
            .mount(&server)
            .await;

        let client = KsqlClient::new(&server.uri())?;
        let KsqlResponse::Success(items) = client
            .create_drop_terminate("CREATE STREAM T AS SELECT * FROM S EMIT CHANGES;")
            .await?
        else {
            panic!("expected success");
        };
        assert_eq!(items[0].command_id, "stream/`T`/create");
        assert_eq!(items[0].command_status.query_id.as_deref(), Some("CSAS_T_0"));
        Ok(())
    }

    #[tokio::test]
    async fn status_not_found_maps_to_404_body() -> Result<(), KsqlClientError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/stream/T/create"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = KsqlClient::new(&server.uri())?;
        match client.status("stream/T/create").await? {
            KsqlResponse::Error(body) => assert_eq!(body.error_code, 404),
            other => panic!("expected an error body, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn status_success() -> Result<(), KsqlClientError> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/status/stream/T/create"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "EXECUTING", "message": "running"})),
            )
            .mount(&server)
            .await;

        let client = KsqlClient::new(&server.uri())?;
        let resp = client.status("stream/T/create").await?;
        assert_eq!(
            resp,
            KsqlResponse::Success(StatusResponse {
                status: "EXECUTING".into(),
                message: "running".into(),
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn other_statuses_are_transport_errors() -> Result<(), KsqlClientError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ksql"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let client = KsqlClient::new(&server.uri())?;
        let err = client.execute("SHOW STREAMS;").await.unwrap_err();
        assert!(matches!(err, KsqlClientError::UnexpectedStatus { status: 503, .. }));
        Ok(())
    }

    #[tokio::test]
    async fn basic_auth_only_with_username() -> Result<(), KsqlClientError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ksql"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = KsqlClient::new(&server.uri())?.with_credentials("user", "secret");
        client.execute("SHOW STREAMS;").await?;

        let anonymous = KsqlClient::new(&server.uri())?.with_credentials("", "ignored");
        assert!(anonymous.credentials.is_none());
        Ok(())
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            KsqlClient::new("not a url"),
            Err(KsqlClientError::InvalidUrl { .. })
        ));
    }
}
