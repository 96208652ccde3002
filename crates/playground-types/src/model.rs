use serde::{Deserialize, Serialize};

/// A model available to the session, as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: String,
    pub provider_family: ProviderFamily,
    pub capabilities: ModelCapabilities,
}

impl ModelInfo {
    /// Build a `ModelInfo` from a raw model id, inferring family,
    /// capabilities, and display name from the id itself.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: format_display_name(&id),
            provider_family: ProviderFamily::infer(&id),
            capabilities: ModelCapabilities::infer(&id),
            id,
        }
    }
}

/// Model vendor, inferred from the model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    OpenAi,
    Anthropic,
    Google,
    Meta,
    Unknown,
}

impl ProviderFamily {
    pub fn infer(model_id: &str) -> Self {
        let lower = model_id.to_lowercase();
        if lower.contains("gpt") || lower.contains("openai") {
            ProviderFamily::OpenAi
        } else if lower.contains("claude") || lower.contains("anthropic") {
            ProviderFamily::Anthropic
        } else if lower.contains("gemini") || lower.contains("google") {
            ProviderFamily::Google
        } else if lower.contains("llama") || lower.contains("meta") {
            ProviderFamily::Meta
        } else {
            ProviderFamily::Unknown
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ProviderFamily::OpenAi => "OpenAI",
            ProviderFamily::Anthropic => "Anthropic",
            ProviderFamily::Google => "Google",
            ProviderFamily::Meta => "Meta",
            ProviderFamily::Unknown => "Unknown",
        }
    }
}

/// What a model can do, matched by name pattern against a static table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// The model produces images via the one-shot generation API.
    pub image_generation: bool,
    /// The model accepts an output resolution tier (image models only).
    pub resolution_control: bool,
}

impl ModelCapabilities {
    pub fn infer(model_id: &str) -> Self {
        let lower = model_id.to_lowercase();
        let image_generation = lower.contains("-image");
        Self {
            image_generation,
            resolution_control: image_generation && lower.starts_with("gemini-3-pro-image"),
        }
    }
}

/// Human-readable name from a raw model id: strips the provider prefix,
/// turns `N-M` digit pairs into `N.M`, and capitalizes the words.
/// `openai/gpt-4o` -> `Gpt 4o`, `gemini-2-5-flash` -> `Gemini 2.5 Flash`.
pub fn format_display_name(model_id: &str) -> String {
    let name = model_id
        .strip_prefix("openai/")
        .or_else(|| model_id.strip_prefix("anthropic/"))
        .or_else(|| model_id.strip_prefix("google/"))
        .or_else(|| model_id.strip_prefix("meta/"))
        .unwrap_or(model_id);

    let name = join_version_digits(name);

    name.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace `<digits>-<digits>` with `<digits>.<digits>`, repeatedly, so
/// `claude-sonnet-4-5` reads `claude-sonnet-4.5`.
fn join_version_digits(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev: Option<char> = None;
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '-'
            && prev.is_some_and(|p| p.is_ascii_digit())
            && chars.peek().is_some_and(|n| n.is_ascii_digit())
        {
            out.push('.');
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
