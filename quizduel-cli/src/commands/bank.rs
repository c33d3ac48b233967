use super::load_bank;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use quizduel_core::{GameConfig, Result};
use std::path::Path;

#[derive(Subcommand)]
pub enum BankCommands {
    /// Categories and how many questions each holds
    Categories,
    /// Questions in a category, without the answers
    List {
        /// Category name, or "all"
        #[arg(default_value = GameConfig::ALL_CATEGORIES)]
        category: String,
    },
}

pub async fn handle_bank_command(cmd: BankCommands, bank_path: Option<&Path>) -> Result<()> {
    let bank = load_bank(bank_path).await?;

    match cmd {
        BankCommands::Categories => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Category", "Questions"]);

            for (category, count) in bank.categories() {
                table.add_row(vec![category, count.to_string()]);
            }

            println!("{}", table);
            println!("{} questions in total", bank.len());
        }

        BankCommands::List { category } => {
            let filter = GameConfig::new(1, category.as_str());
            let questions: Vec<_> = bank
                .questions()
                .iter()
                .filter(|q| filter.accepts_category(&q.category))
                .collect();

            if questions.is_empty() {
                println!("No questions in category '{}'.", category);
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["#", "Category", "Question", "Options"]);

            for (i, question) in questions.iter().enumerate() {
                table.add_row(vec![
                    (i + 1).to_string(),
                    question.category.clone(),
                    question.prompt.clone(),
                    question.answer_options.len().to_string(),
                ]);
            }

            println!("{}", table);
        }
    }

    Ok(())
}
