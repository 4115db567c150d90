//! Method dispatch: turns a parsed [`RequestEnvelope`] into a
//! [`ResponseEnvelope`], independent of whatever applied auth/rate-limit/
//! concurrency checks ran first.

use astdb_domain::error::Error;
use astdb_domain::ports::query_server::{
    QueryRequestHandler, RequestEnvelope, ResponseEnvelope, ResponseError, SearchParams,
};
use serde::Deserialize;
use validator::Validate;

/// Wire shape of `search`'s params, validated before it's mapped into the
/// domain's [`SearchParams`].
#[derive(Debug, Deserialize, Validate)]
struct SearchRequestBody {
    query: Option<String>,
    query_vector: Option<Vec<f32>>,
    #[validate(range(min = 1))]
    k: Option<usize>,
    #[validate(range(min = 1))]
    ef: Option<usize>,
}

fn error_response(id: String, code: &str, message: impl Into<String>) -> ResponseEnvelope {
    ResponseEnvelope {
        id,
        result: None,
        error: Some(ResponseError { code: code.to_string(), message: message.into(), data: None }),
    }
}

fn domain_error_response(id: String, err: Error) -> ResponseEnvelope {
    error_response(id, err.kind.as_str(), err.message)
}

/// Resolve one already-admitted, already-authenticated request.
pub async fn dispatch(handler: &dyn QueryRequestHandler, request: RequestEnvelope) -> ResponseEnvelope {
    let id = request.id;
    match request.method.as_str() {
        "index_status" => match handler.index_status().await {
            Ok(status) => ResponseEnvelope {
                id,
                result: Some(serde_json::to_value(status).unwrap_or(serde_json::Value::Null)),
                error: None,
            },
            Err(err) => domain_error_response(id, err),
        },
        "list_tools" => match handler.list_tools().await {
            Ok(tools) => ResponseEnvelope {
                id,
                result: Some(serde_json::to_value(tools).unwrap_or(serde_json::Value::Null)),
                error: None,
            },
            Err(err) => domain_error_response(id, err),
        },
        "search" => {
            let params = request.params.unwrap_or(serde_json::Value::Null);
            let body: SearchRequestBody = match serde_json::from_value(params) {
                Ok(body) => body,
                Err(e) => return error_response(id, "validation", format!("malformed search params: {e}")),
            };
            if let Err(e) = body.validate() {
                return error_response(id, "validation", e.to_string());
            }

            let search_params = SearchParams {
                query: body.query,
                query_vector: body.query_vector,
                k: body.k,
                ef: body.ef,
            };
            match handler.search(search_params).await {
                Ok(results) => ResponseEnvelope {
                    id,
                    result: Some(serde_json::to_value(results).unwrap_or(serde_json::Value::Null)),
                    error: None,
                },
                Err(err) => domain_error_response(id, err),
            }
        }
        other => error_response(id, "protocol", format!("unknown method: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astdb_domain::error::Result;
    use astdb_domain::model::QueryResult;
    use astdb_domain::ports::query_server::{IndexStatus, ToolDescriptor};
    use async_trait::async_trait;

    struct FakeHandler;

    #[async_trait]
    impl QueryRequestHandler for FakeHandler {
        async fn index_status(&self) -> Result<IndexStatus> {
            Ok(IndexStatus { vector_count: 1, last_saved: None, status: "running".to_string() })
        }
        async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
            Ok(vec![])
        }
        async fn search(&self, params: SearchParams) -> Result<Vec<QueryResult>> {
            if params.query_vector.is_none() && params.query.is_none() {
                return Err(Error::validation("missing query"));
            }
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn routes_index_status() {
        let request = RequestEnvelope { id: "1".to_string(), method: "index_status".to_string(), params: None };
        let response = dispatch(&FakeHandler, request).await;
        assert!(response.error.is_none());
        assert!(response.result.is_some());
    }

    #[tokio::test]
    async fn rejects_unknown_method() {
        let request = RequestEnvelope { id: "2".to_string(), method: "delete_everything".to_string(), params: None };
        let response = dispatch(&FakeHandler, request).await;
        assert_eq!(response.error.unwrap().code, "protocol");
    }

    #[tokio::test]
    async fn rejects_search_with_zero_k() {
        let params = serde_json::json!({ "query": "x", "k": 0 });
        let request = RequestEnvelope { id: "3".to_string(), method: "search".to_string(), params: Some(params) };
        let response = dispatch(&FakeHandler, request).await;
        assert_eq!(response.error.unwrap().code, "validation");
    }

    #[tokio::test]
    async fn propagates_handler_error_kind_as_code() {
        let request = RequestEnvelope { id: "4".to_string(), method: "search".to_string(), params: Some(serde_json::json!({})) };
        let response = dispatch(&FakeHandler, request).await;
        assert_eq!(response.error.unwrap().code, "validation");
    }
}
