//! `astdb query`: one-shot local similarity search, resolving the same
//! [`DefaultQueryHandler`] the query server (`astdb serve`) uses, without a
//! network round-trip.

use std::path::Path;
use std::sync::atomic::AtomicU8;
use std::sync::Arc;

use astdb_domain::error::Result;
use astdb_domain::ports::query_server::{QueryRequestHandler, SearchParams};
use astdb_infrastructure::AstdbLayout;
use astdb_server::DefaultQueryHandler;

use crate::wiring;

pub async fn run(workspace: &Path, text: String, top: usize) -> Result<()> {
    let layout = AstdbLayout::new(workspace);
    let embedder = wiring::build_embedder()?;
    let vector_store = wiring::build_vector_store(&layout, embedder.dimension(), None).await?;
    let lifecycle = Arc::new(AtomicU8::new(1));
    let handler = DefaultQueryHandler::new(vector_store, embedder, top.max(1), top.max(1), lifecycle);

    let results = handler
        .search(SearchParams {
            query: Some(text),
            query_vector: None,
            k: Some(top),
            ef: None,
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
