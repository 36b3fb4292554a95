//! Audience demographics inference from profile-level signals.

use instalens_core::AudienceDemographics;

use crate::client::GeminiClient;
use crate::error::GeminiError;
use crate::response::parse_model_json;
use crate::wire::Part;

/// Caption text beyond this many characters is dropped from the prompt.
const CAPTION_SUMMARY_CHARS: usize = 500;

/// What the model is told about a profile when guessing its audience.
#[derive(Debug, Clone, Default)]
pub struct AudienceSignals<'a> {
    pub username: &'a str,
    pub full_name: &'a str,
    pub followers: u64,
    pub posts_count: u64,
    pub captions: Vec<&'a str>,
    pub tags: Vec<&'a str>,
}

impl AudienceSignals<'_> {
    fn caption_summary(&self) -> String {
        self.captions
            .join("\n")
            .chars()
            .take(CAPTION_SUMMARY_CHARS)
            .collect()
    }

    pub(crate) fn prompt(&self) -> String {
        let mut prompt = String::from(
            "Analyze the following influencer data and infer the audience demographics.\n\
             Respond ONLY with a single JSON object. Do not include any text or markdown formatting before or after the JSON.\n\
             Influencer Data:\n",
        );
        prompt.push_str(&format!(
            "- Username: {}\n\
             - Full Name: {}\n\
             - Followers: {}\n\
             - Posts Count: {}\n\
             - Recent Post Captions Summary: {}...\n\
             - Common Post Tags: {}\n",
            self.username,
            self.full_name,
            self.followers,
            self.posts_count,
            self.caption_summary(),
            self.tags.join(", "),
        ));
        prompt.push_str(
            r#"The JSON object must have the following structure:
{
  "genderSplit": [{ "name": "Male", "value": 55 }, { "name": "Female", "value": 45 }],
  "ageGroups": [{ "name": "18-24", "value": 30 }, { "name": "25-34", "value": 40 }, { "name": "35-44", "value": 20 }, { "name": "45+", "value": 10 }],
  "topGeographies": [{ "name": "USA", "value": 25 }, { "name": "Brazil", "value": 15 }, { "name": "India", "value": 10 }]
}
- "genderSplit": An array of objects representing the percentage split. The sum of values should be 100.
- "ageGroups": An array of objects representing the percentage split across age groups. The sum of values should be 100.
- "topGeographies": An array of the top 3 countries with their percentage. The sum does not have to be 100."#,
        );
        prompt
    }
}

impl GeminiClient {
    /// Infers gender, age and geography splits for the profile's audience.
    ///
    /// # Errors
    ///
    /// - [`GeminiError::MissingApiKey`] when no key is configured.
    /// - [`GeminiError::Api`], [`GeminiError::Http`],
    ///   [`GeminiError::EmptyResponse`] or [`GeminiError::Deserialize`] for
    ///   transport and model failures.
    pub async fn infer_demographics(
        &self,
        signals: &AudienceSignals<'_>,
    ) -> Result<AudienceDemographics, GeminiError> {
        tracing::debug!(
            username = signals.username,
            model = self.model(),
            "inferring audience demographics"
        );
        let text = self
            .generate(vec![Part::Text {
                text: signals.prompt(),
            }])
            .await?;
        parse_model_json(&text, "audience demographics")
    }
}
