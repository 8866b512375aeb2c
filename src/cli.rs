use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_QUESTION: &str = "Compare the revenue growth of Microsoft and Apple in 2024";
pub const DEFAULT_MATH_QUESTION: &str = "What is 40 + (100-30) * 5 ? Calculate step by step";

#[derive(Debug, Parser)]
#[command(name = "reagent", version)]
#[command(about = "Ask questions over persisted document indexes with a ReAct agent on Ollama")]
pub struct Cli {
    /// Config file (falls back to REAGENT_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a question using one query tool per collection
    Ask {
        #[arg(default_value = DEFAULT_QUESTION)]
        question: String,
    },
    /// Load or rebuild every collection index and report the result
    Index {
        /// Skip loading and rebuild every collection from its sources
        #[arg(long)]
        rebuild: bool,
    },
    /// Query one collection directly, without the agent
    Query { collection: String, question: String },
    /// Solve an arithmetic question with add, subtract and multiply tools
    Math {
        #[arg(default_value = DEFAULT_MATH_QUESTION)]
        question: String,
    },
    /// Send a single prompt to the chat model
    Complete { prompt: String },
    /// Print the agent's prompt templates
    Prompts,
}
