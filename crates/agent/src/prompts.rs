use carfinder_core::domain::criterion::{Criterion, ALL_CRITERIA, FUEL_TYPES};
use tera::{Context, Tera};
use thiserror::Error;

const EXTRACTION_TEMPLATE_NAME: &str = "extraction.txt";
const GATEKEEPER_TEMPLATE_NAME: &str = "gatekeeper.txt";

const EXTRACTION_TEMPLATE: &str = r#"Extract car-shopping filters from English free text.
- OUTPUT POLICY:
  * Include ONLY the keys the user explicitly stated.
  * Do NOT guess or infer unspecified fields.
  * For brand/model/fuel:
      - If the user says 'any' or 'no preference', return an empty string "".
      - If the user does not specify, OMIT the key.
  * For numeric fields (price, mileage, etc.):
      - If the user says 'no limit', return 0.
      - If the user does not specify, OMIT the key.
- Allowed keys: {{ keys | join(sep=", ") }}.
- Interpret 'under 20k' => price_max=20000; 'since 2018' => year_min=2018.
- Fuels: {{ fuels | join(sep=", ") }}. Prices in USD. Mileage in kilometers.
Return ONLY a JSON object that matches the schema. Do not wrap in markdown. No extra text.
{% if current_field %}
CURRENT_FIELD: {{ current_field }}
CURRENT_FIELD_TYPE: {{ current_field_type }}
TASK: Return a JSON object with any keys explicitly stated by the user in THIS message.
ALSO apply this special rule ONLY for CURRENT_FIELD:
  - If the message is negative for CURRENT_FIELD (e.g., 'no', 'none', 'nope', 'n/a', 'na', 'skip', 'any', 'no preference', or the line is blank), then include CURRENT_FIELD with empty string "" (if string) or 0 (if numeric).
RULES:
  - Do NOT invent keys. Apart from the special rule above for CURRENT_FIELD, only include keys explicitly stated in the text.
  - Never unset or change other keys implicitly; only output keys explicitly stated in this message or the special CURRENT_FIELD mapping.
  - If nothing is extractable, return {}.
EXAMPLES (apply to this message only):
  Asked: budget; User: 'no' -> {"price_max": 0}
  Asked: budget; User: 'No, I want a new Fiat since 2017' -> {"price_max": 0, "is_new": true, "make": "Fiat", "year_min": 2017}
  Asked: brand;  User: 'I want a Honda under 30k' -> {"make": "Honda", "price_max": 30000}
{% endif %}

User text:
{{ user_text }}

Return ONLY a valid JSON object that matches the schema."#;

const GATEKEEPER_TEMPLATE: &str = r#"You are a strict gatekeeper. Decide if the user explicitly asked to proceed with the search now.
Respond with EXACTLY ONE of: PROCEED or ASK.
Return PROCEED ONLY if the user clearly expressed intent to start the search using phrases like:
  'search', 'go', 'run', 'proceed', 'ready', "that's it", "let's search", 'please search', 'query', 'enough questions', 'done', 'finish'.
For any other message (including more preferences), return ASK.

User input:
{{ user_text }}"#;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt template failed to load: {0}")]
    Load(String),
    #[error("prompt `{name}` failed to render: {message}")]
    Render { name: &'static str, message: String },
}

/// Fixed prompt texts fed to the language model.
#[derive(Clone, Debug)]
pub struct PromptTemplates {
    tera: Tera,
}

impl PromptTemplates {
    pub fn new() -> Result<Self, PromptError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (EXTRACTION_TEMPLATE_NAME, EXTRACTION_TEMPLATE),
            (GATEKEEPER_TEMPLATE_NAME, GATEKEEPER_TEMPLATE),
        ])
        .map_err(|error| PromptError::Load(error.to_string()))?;
        Ok(Self { tera })
    }

    pub fn extraction(
        &self,
        user_text: &str,
        hint: Option<Criterion>,
    ) -> Result<String, PromptError> {
        let keys: Vec<&str> = ALL_CRITERIA.iter().map(|criterion| criterion.key()).collect();
        let fuels: Vec<&str> = FUEL_TYPES.iter().map(|fuel| fuel.as_str()).collect();
        let field_type = hint.map(|criterion| criterion.kind().declared_type());

        let mut context = Context::new();
        context.insert("keys", &keys);
        context.insert("fuels", &fuels);
        context.insert("user_text", user_text);
        context.insert("current_field", &hint.map(Criterion::key));
        context.insert("current_field_type", &field_type);

        self.render(EXTRACTION_TEMPLATE_NAME, &context)
    }

    pub fn gatekeeper(&self, user_text: &str) -> Result<String, PromptError> {
        let mut context = Context::new();
        context.insert("user_text", user_text);
        self.render(GATEKEEPER_TEMPLATE_NAME, &context)
    }

    fn render(&self, name: &'static str, context: &Context) -> Result<String, PromptError> {
        self.tera
            .render(name, context)
            .map_err(|error| PromptError::Render { name, message: error.to_string() })
    }
}
