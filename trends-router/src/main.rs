/*
┌─────────────────────────────────────────────────────────────────────────────┐
│                         YOUTUBE TRENDS ROUTER                                │
└─────────────────────────────────────────────────────────────────────────────┘

  ROUTE
    │
    ├─> Classify query (language model, or keywords with --keyword-router)
    └─> structured | semantic | hybrid | unknown

         ↓

  STRUCTURED AGENT (structured, hybrid)
    │
    ├─> Model drafts one read-only SELECT
    └─> SQLite runs it, rows rendered as text

         ↓

  SEMANTIC AGENT (semantic, hybrid; always after the structured agent)
    │
    ├─> Embed query, search the Qdrant collection
    └─> Ranked videos + summary

         ↓

  SYNTHESIZE
    │
    ├─> One engine: its answer as-is
    ├─> Both: narrative merge, or "Structured Analysis / Semantic Search"
    └─> None: ask the user to rephrase

EXAMPLE COMMANDS:

  # Interactive session
  trends-router

  # One question
  trends-router --query "Which category has the most videos?"

  # Semantic search with filters, saved as JSON
  trends-router --query "Find cooking tutorials" \
    --filter category="Howto & Style" --save ./OUTPUT

  # Show how a question would be routed
  trends-router --query "Top gaming videos about Minecraft" --route-only

*/

use clap::Parser;
use trends_router::cli::{self, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    cli::run(args).await
}
