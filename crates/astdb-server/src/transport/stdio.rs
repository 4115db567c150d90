//! Newline-delimited JSON over stdin/stdout: one logical connection, one
//! request in flight at a time from the transport's point of view (the
//! server's own concurrency admission still applies to the pipeline).

use std::sync::Arc;

use astdb_domain::ports::query_server::{RequestEnvelope, ResponseEnvelope, ResponseError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::server::QueryServer;

const CLIENT_KEY: &str = "stdio";

/// Run the read-dispatch-write loop until stdin closes.
pub async fn serve(server: Arc<QueryServer>) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RequestEnvelope>(trimmed) {
            Ok(request) => {
                let id = request.id.clone();
                server.handle_request(id, trimmed.len(), None, CLIENT_KEY, request).await
            }
            Err(e) => {
                warn!(error = %e, "malformed request line on stdio transport");
                ResponseEnvelope {
                    id: "unknown".to_string(),
                    result: None,
                    error: Some(ResponseError {
                        code: "protocol".to_string(),
                        message: format!("malformed request: {e}"),
                        data: None,
                    }),
                }
            }
        };

        let mut payload = serde_json::to_vec(&response).unwrap_or_default();
        payload.push(b'\n');
        stdout.write_all(&payload).await?;
        stdout.flush().await?;
    }

    Ok(())
}
