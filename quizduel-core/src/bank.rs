use crate::error::{QuizduelError, Result};
use crate::types::{GameConfig, Question};
use std::collections::BTreeMap;
use std::path::Path;

const BUNDLED_QUESTIONS: &str = include_str!("../data/questions.json");

/// Read-only collection of questions supplied at startup
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Result<Self> {
        if let Some(bad) = questions.iter().position(|q| !q.is_well_formed()) {
            return Err(QuizduelError::bank(format!(
                "Question #{} is malformed (needs a prompt, two or more answers and a valid correct index)",
                bad
            )));
        }

        Ok(Self { questions })
    }

    /// Small sample bank compiled into the binary
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_QUESTIONS)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Self::new(questions)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            QuizduelError::bank(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let bank = Self::from_json(&content)?;
        tracing::info!(
            "Loaded {} questions from {}",
            bank.len(),
            path.display()
        );
        Ok(bank)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Questions the given match configuration may draw from
    pub fn eligible(&self, config: &GameConfig) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| config.accepts_category(&q.category))
            .cloned()
            .collect()
    }

    /// Question count per category, sorted by name
    pub fn categories(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for question in &self.questions {
            *counts.entry(question.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_bundled_bank_is_valid() {
        let bank = QuestionBank::bundled().unwrap();
        assert!(!bank.is_empty());
        assert_eq!(bank.categories().len(), 3);
    }

    #[test]
    fn test_eligible_filters_by_category() {
        let bank = QuestionBank::bundled().unwrap();
        let science = bank.eligible(&GameConfig::new(2, "science"));
        assert!(science.iter().all(|q| q.category == "science"));
        assert_eq!(bank.eligible(&GameConfig::new(2, "all")).len(), bank.len());
    }

    #[test]
    fn test_rejects_out_of_range_answer() {
        let json = r#"[{"category":"x","question":"?","answers":["a","b"],"correct":5}]"#;
        assert!(matches!(
            QuestionBank::from_json(json),
            Err(QuizduelError::Bank(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(
            &path,
            r#"[{"category":"art","question":"Who painted Guernica?","answers":["Picasso","Dali"],"correct":0}]"#,
        )
        .unwrap();

        let bank = QuestionBank::load(&path).await.unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank.questions()[0].correct_text(), "Picasso");

        let missing = QuestionBank::load(&dir.path().join("nope.json")).await;
        assert!(missing.is_err());
    }
}
