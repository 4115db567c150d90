//! `astdb serve`: run the C10 query server against the workspace's vector
//! store. Not named in the original request/response surface, but every
//! transport it offers (stdio/websocket/http) needs a process to host it
//! in, the same way the teacher ships its MCP server behind `mcb serve`.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU8;
use std::sync::Arc;

use astdb_domain::error::Result;
use astdb_infrastructure::{load_config, AstdbLayout};
use astdb_server::{DefaultQueryHandler, QueryServer};

use crate::wiring;

pub async fn run(workspace: &Path, config_path: Option<PathBuf>) -> Result<()> {
    let layout = AstdbLayout::new(workspace);
    layout.ensure().await?;

    let config = load_config(workspace, config_path.as_deref(), None, None)?;
    let embedder = wiring::build_embedder()?;
    let vector_store = wiring::build_vector_store(&layout, embedder.dimension(), None).await?;

    let lifecycle = Arc::new(AtomicU8::new(0));
    let default_k = config.query_server.max_query_results.min(10).max(1);
    let handler = Arc::new(DefaultQueryHandler::new(
        vector_store,
        embedder,
        default_k,
        config.query_server.max_query_results.max(1),
        Arc::clone(&lifecycle),
    ));

    let server = Arc::new(QueryServer::new(handler, config.query_server, lifecycle));
    astdb_server::run(server).await.map_err(|e| astdb_domain::error::Error::protocol(e.to_string()))
}
