//! Terminal prompts.

use async_trait::async_trait;
use dialoguer::{Input, Select};
use polyver_core::clients::Prompter;
use polyver_core::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct DialoguerPrompter;

#[async_trait]
impl Prompter for DialoguerPrompter {
    async fn select(&self, message: &str, items: &[String]) -> Result<Option<usize>> {
        let message = message.to_string();
        let items = items.to_vec();
        tokio::task::spawn_blocking(move || {
            Select::new()
                .with_prompt(message)
                .items(&items)
                .default(0)
                .interact_opt()
                .map_err(prompt_error)
        })
        .await
        .map_err(|e| Error::Prompt(e.to_string()))?
    }

    async fn input(&self, message: &str) -> Result<String> {
        let message = message.to_string();
        tokio::task::spawn_blocking(move || {
            Input::<String>::new()
                .with_prompt(message)
                .interact_text()
                .map_err(prompt_error)
        })
        .await
        .map_err(|e| Error::Prompt(e.to_string()))?
    }
}

fn prompt_error(e: dialoguer::Error) -> Error {
    match e {
        dialoguer::Error::IO(io_err) => Error::Prompt(io_err.to_string()),
    }
}
