#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::error::*;
    use crate::message::*;
    use crate::model::*;
    use crate::session::*;

    // ─── Message Tests ───────────────────────────────────────

    #[test]
    fn test_user_message_has_one_version() {
        let msg = Message::user("Hello", Vec::new());
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.versions.len(), 1);
        assert_eq!(msg.versions[0].content, "Hello");
        assert_eq!(msg.active_version, 0);
        assert!(msg.attachments.is_empty());
    }

    #[test]
    fn test_user_message_keeps_attachment_order() {
        let atts = vec![
            Attachment::new("https://x/a.png", "image/png", "a.png"),
            Attachment::new("https://x/b.pdf", "application/pdf", "b.pdf"),
        ];
        let msg = Message::user("see files", atts);
        assert_eq!(msg.attachments.len(), 2);
        assert_eq!(msg.attachments[0].filename, "a.png");
        assert!(msg.attachments[0].is_image());
        assert!(!msg.attachments[1].is_image());
    }

    #[test]
    fn test_assistant_placeholder_is_empty() {
        let msg = Message::assistant_placeholder();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.versions.len(), 1);
        assert_eq!(msg.versions[0].content, "");
        assert!(msg.versions[0].reasoning_content.is_none());
        assert!(msg.versions[0].generated_image.is_none());
        assert!(!msg.versions[0].editing);
    }

    #[test]
    fn test_message_keys_are_unique() {
        let a = Message::user("a", Vec::new());
        let b = Message::user("b", Vec::new());
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn test_version_lookup() {
        let msg = Message::user("x", Vec::new());
        let id = msg.versions[0].id.clone();
        assert!(msg.version(&id).is_some());
        assert!(msg.version(&VersionId::new()).is_none());
    }

    #[test]
    fn test_message_serialization_roundtrip() {
        let msg = Message::user("test input", vec![Attachment::new("u", "image/png", "f")]);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.key, msg.key);
        assert_eq!(back.versions[0].content, "test input");
        assert_eq!(back.attachments, msg.attachments);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            r#""assistant""#
        );
    }

    // ─── RequestContent Tests ────────────────────────────────

    #[test]
    fn test_request_content_text_serializes_as_string() {
        let content = RequestContent::Text("hi".to_string());
        assert_eq!(serde_json::to_string(&content).unwrap(), r#""hi""#);
    }

    #[test]
    fn test_request_content_parts_wire_shape() {
        let content = RequestContent::Parts(vec![
            ContentPart::Text {
                text: "caption".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "https://x/a.png".to_string(),
                },
            },
        ]);
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json[0]["type"], "text");
        assert_eq!(json[1]["type"], "image_url");
        assert_eq!(json[1]["image_url"]["url"], "https://x/a.png");
    }

    #[test]
    fn test_request_content_as_text() {
        assert_eq!(RequestContent::Text("a".into()).as_text(), "a");
        let parts = RequestContent::Parts(vec![ContentPart::Text { text: "b".into() }]);
        assert_eq!(parts.as_text(), "b");
        assert_eq!(RequestContent::Parts(vec![]).as_text(), "");
    }

    // ─── Model Tests ─────────────────────────────────────────

    #[test]
    fn test_provider_family_inference() {
        assert_eq!(ProviderFamily::infer("gpt-oss-120b"), ProviderFamily::OpenAi);
        assert_eq!(
            ProviderFamily::infer("claude-sonnet-4-5"),
            ProviderFamily::Anthropic
        );
        assert_eq!(
            ProviderFamily::infer("gemini-2.5-flash"),
            ProviderFamily::Google
        );
        assert_eq!(ProviderFamily::infer("llama-3-70b"), ProviderFamily::Meta);
        assert_eq!(ProviderFamily::infer("chat_20706"), ProviderFamily::Unknown);
    }

    #[test]
    fn test_image_capability_table() {
        assert!(ModelCapabilities::infer("gemini-2.5-flash-image").image_generation);
        assert!(ModelCapabilities::infer("gemini-3-pro-image").image_generation);
        assert!(!ModelCapabilities::infer("gemini-2.5-flash").image_generation);
        assert!(!ModelCapabilities::infer("gpt-oss-120b-medium").image_generation);
    }

    #[test]
    fn test_resolution_control_only_on_new_image_models() {
        assert!(ModelCapabilities::infer("gemini-3-pro-image").resolution_control);
        assert!(!ModelCapabilities::infer("gemini-2.5-flash-image").resolution_control);
        assert!(!ModelCapabilities::infer("gemini-3-pro-high").resolution_control);
    }

    #[test]
    fn test_display_name_formatting() {
        assert_eq!(format_display_name("claude-sonnet-4-5"), "Claude Sonnet 4.5");
        assert_eq!(
            format_display_name("gemini-2-5-flash-image"),
            "Gemini 2.5 Flash Image"
        );
        assert_eq!(format_display_name("openai/gpt-oss-120b"), "Gpt Oss 120b");
        assert_eq!(format_display_name("chat_20706"), "Chat 20706");
    }

    #[test]
    fn test_display_name_keeps_non_ascii_ids_intact() {
        assert_eq!(format_display_name("modèle-4-5"), "Modèle 4.5");
        assert_eq!(format_display_name("qwen-通义-7b"), "Qwen 通义 7b");
    }

    #[test]
    fn test_model_info_from_id() {
        let info = ModelInfo::from_id("gemini-3-pro-image");
        assert_eq!(info.provider_family, ProviderFamily::Google);
        assert!(info.capabilities.image_generation);
        assert!(info.capabilities.resolution_control);
        assert_eq!(info.display_name, "Gemini 3 Pro Image");
    }

    // ─── Config Tests ────────────────────────────────────────

    #[test]
    fn test_sampling_defaults() {
        let s = SamplingConfig::default();
        assert_eq!(s.temperature, 0.7);
        assert_eq!(s.max_tokens, 2048);
        assert_eq!(s.top_p, 1.0);
        assert_eq!(s.frequency_penalty, 0.0);
        assert_eq!(s.presence_penalty, 0.0);
    }

    #[test]
    fn test_image_config_defaults() {
        let c = ImageConfig::default();
        assert_eq!(c.aspect_ratio, AspectRatio::Square);
        assert!(c.resolution.is_none());
    }

    #[test]
    fn test_aspect_ratio_wire_format() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Landscape).unwrap(),
            r#""16:9""#
        );
        assert_eq!(AspectRatio::Portrait.as_str(), "9:16");
    }

    #[test]
    fn test_resolution_tier_wire_format() {
        assert_eq!(
            serde_json::to_string(&ResolutionTier::TwoK).unwrap(),
            r#""2K""#
        );
        assert_eq!(ResolutionTier::FourK.as_str(), "4K");
    }

    #[test]
    fn test_engine_config_roundtrip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sampling, config.sampling);
        assert_eq!(back.image, config.image);
    }

    // ─── Session Tests ───────────────────────────────────────

    #[test]
    fn test_status_admission() {
        assert!(SessionStatus::Idle.accepts_send());
        assert!(SessionStatus::Ready.accepts_send());
        assert!(SessionStatus::Error.accepts_send());
        assert!(!SessionStatus::Submitted.accepts_send());
        assert!(!SessionStatus::Streaming.accepts_send());
    }

    #[test]
    fn test_status_in_flight() {
        assert!(SessionStatus::Submitted.in_flight());
        assert!(SessionStatus::Streaming.in_flight());
        assert!(!SessionStatus::Ready.in_flight());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SessionStatus::Streaming).unwrap(),
            r#""streaming""#
        );
    }

    #[test]
    fn test_chat_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&ChatMode::ImageGeneration).unwrap(),
            r#""imageGeneration""#
        );
        assert_eq!(ChatMode::default(), ChatMode::Chat);
    }

    // ─── Error Tests ─────────────────────────────────────────

    #[test]
    fn test_error_display() {
        let e = EngineError::Validation("empty message".to_string());
        assert_eq!(e.to_string(), "validation error: empty message");

        let e = EngineError::Invariant("no model selected".to_string());
        assert_eq!(e.to_string(), "no model selected");
    }

    #[test]
    fn test_error_from_serde() {
        let bad: std::result::Result<ModelInfo, _> = serde_json::from_str("{");
        let err: EngineError = bad.unwrap_err().into();
        assert!(matches!(err, EngineError::Serialization(_)));
    }
}
