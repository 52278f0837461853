use crate::models::{
    Document, Formality, LengthTier, Mode, Persona, PipelineRequest, Region, RegionSetting,
    Register, Tone,
};

/// Output contract appended to every structured prompt
const JSON_SUBJECT_BODY: &str = r#"Respond ONLY with valid JSON:
{ "subject": "string", "body": "string" }"#;

const JSON_SUBJECT_BODY_CORRECTIONS: &str = r#"Respond ONLY with valid JSON:
{ "subject": "string", "body": "string", "corrections": ["short description of each change"] }
Use an empty corrections array when nothing needed changing."#;

const FORMALITY_RULES: &str = r#"FORMALITY RULES:
- Preference "informal": address the reader as TÚ (tú/te/tu) everywhere, no exceptions.
- Preference "formal": address the reader as USTED (usted/le/su) everywhere, no exceptions.
- Preference "auto": decide as a real professional would.
  * USTED for clients, new contacts, people higher in the hierarchy, formal B2B.
  * TÚ for colleagues and close or informal contexts.
  * When in doubt, use USTED.
- NEVER mix tú and usted in the same email."#;

fn tone_spec(tone: Tone) -> &'static str {
    match tone {
        Tone::Neutral => {
            "TONE: NEUTRAL\n\
             - Balanced professional tone, neither cold nor warm.\n\
             - Straight to the point, no emotional charge."
        }
        Tone::Warm => {
            "TONE: WARM\n\
             - Considerate and empathetic; care for the relationship shows.\n\
             - Soften difficult messages with diplomacy.\n\
             - Natural courtesy phrases, never exaggerated."
        }
        Tone::Firm => {
            "TONE: FIRM\n\
             - Direct, confident, unambiguous, never aggressive.\n\
             - Action language: necesitamos, esperamos, requerimos.\n\
             - No detours or excessive justification."
        }
        Tone::Urgent => {
            "TONE: URGENT\n\
             - Signal priority from the subject line on.\n\
             - The first paragraph states the urgency and the action required.\n\
             - Concrete time references (antes del viernes, en las próximas 24 horas).\n\
             - Close by reinforcing the deadline without sounding desperate."
        }
    }
}

/// Phrasing bias that tells versions apart
pub fn persona_directive(persona: Persona) -> &'static str {
    match persona {
        Persona::Direct => "Executive approach: get to the point, no long introductions.",
        Persona::Empathetic => {
            "Relational approach: show understanding before presenting the problem or request."
        }
        Persona::Formal => "Structured approach: organize the email clearly, paragraph by paragraph.",
    }
}

fn region_profile(region: Region) -> &'static str {
    match region {
        Region::Spain => {
            "Target country: SPAIN\n\
             - Peninsular Spanish (es-ES).\n\
             - Greetings: \"Buenos días\", \"Buenas tardes\", \"Estimado/a\".\n\
             - Closings: \"Un saludo\", \"Quedamos a su disposición\", \"Atentamente\".\n\
             - Direct and concise, less effusive than Latin America.\n\
             - Vocabulary: ordenador, móvil, presupuesto.\n\
             - Avoid \"cordialmente\" and warm Latin American phrasing.\n\
             - No vosotros unless the email clearly addresses a group."
        }
        Region::Mexico => {
            "Target country: MEXICO\n\
             - Standard professional Mexican Spanish.\n\
             - Greetings: \"Estimado/a\", \"Buen día\".\n\
             - Closings: \"Quedamos atentos\", \"Saludos cordiales\", \"Quedo a sus órdenes\".\n\
             - Relational but formal, with natural Mexican courtesy.\n\
             - Vocabulary: computadora, celular, cotización.\n\
             - Avoid slang and peninsular phrasing (\"un saludo\", \"ordenador\")."
        }
        Region::Argentina => {
            "Target country: ARGENTINA\n\
             - Professional Argentine Spanish.\n\
             - Close or informal emails may use moderate voseo (vos/tenés/podés).\n\
             - Formal emails use usted, no voseo.\n\
             - Greetings: \"Estimado/a\", \"Buen día\".\n\
             - Closings: \"Saludos\", \"Quedo a disposición\", \"Cordialmente\".\n\
             - Avoid lunfardo, \"che\", peninsular phrasing."
        }
        Region::Chile => {
            "Target country: CHILE\n\
             - Sober professional Chilean Spanish.\n\
             - Greetings: \"Estimado/a\", \"Junto con saludar\".\n\
             - Closings: \"Saludos\", \"Quedamos atentos\".\n\
             - Direct and respectful, balancing clarity and formality.\n\
             - Vocabulary: computador, celular, cotización.\n\
             - Avoid filler words (\"po\", \"cachai\")."
        }
        Region::Colombia => {
            "Target country: COLOMBIA\n\
             - Professional Colombian Spanish.\n\
             - Greetings: \"Estimado/a\", \"Cordial saludo\".\n\
             - Closings: \"Cordialmente\", \"Quedo atento/a\", \"Saludos\".\n\
             - Formal, respectful, cordial.\n\
             - Vocabulary: computador, celular, cotización.\n\
             - Avoid peninsular expressions and overly informal tone."
        }
    }
}

/// System prompt for the drafting stage
pub fn draft_system_prompt(tone: Tone, persona: Persona) -> String {
    format!(
        "You are an expert writer of professional emails in Spanish.\n\
         {persona}\n\n\
         YOUR ONLY TASK: write a natural, effective professional email.\n\n\
         REQUIRED {tone}\n\n\
         Never pad with empty phrases; every line must carry information.\n\n\
         {FORMALITY_RULES}\n\n\
         {JSON_SUBJECT_BODY}",
        persona = persona_directive(persona),
        tone = tone_spec(tone),
    )
}

/// User prompt for the drafting stage
pub fn draft_user_prompt(request: &PipelineRequest) -> String {
    let mut prompt = String::new();

    if request.style.mode == Mode::Reply {
        if let Some(original) = &request.original_message {
            prompt.push_str("The sender received this email and must answer it:\n---\n");
            prompt.push_str(original);
            prompt.push_str("\n---\n\n");
        }
    }

    prompt.push_str(&format!("Instruction: {}\n", request.instruction));
    prompt.push_str(&format!(
        "Sender: {}{}\n",
        request.sender_name,
        role_suffix(&request.sender_role)
    ));
    prompt.push_str(&format!(
        "Recipient: {}{}\n",
        request.recipient_name,
        role_suffix(&request.recipient_role)
    ));
    prompt.push_str(&format!(
        "Formality preference: {}\n",
        request.style.formality.as_str()
    ));
    prompt.push_str(&format!("Required tone: {}\n\n", request.style.tone.as_str()));
    prompt.push_str("Write the email.\n");

    prompt
}

fn role_suffix(role: &Option<String>) -> String {
    role.as_deref()
        .map(|r| format!(" ({r})"))
        .unwrap_or_default()
}

/// System prompt for the length adjustment stage
pub fn length_system_prompt(length: LengthTier) -> String {
    let (min, max) = length.line_band();
    format!(
        "You are an editor of professional emails in Spanish.\n\n\
         YOUR ONLY TASK: rewrite the body so that its content has between {min} and {max} lines.\n\
         - Count only content lines; the salutation and the closing/signature do not count.\n\
         - Keep every fact, name, date, and figure.\n\
         - Keep the tone, the formality (tú/usted), and the language.\n\
         - Keep the salutation and the closing as they are.\n\
         - Do not change the subject unless it contradicts the body.\n\n\
         {JSON_SUBJECT_BODY}"
    )
}

pub fn length_user_prompt(document: &Document, length: LengthTier) -> String {
    let (min, max) = length.line_band();
    format!(
        "Email to adjust:\n\nSubject: {}\n\nBody:\n{}\n\n\
         Target length: {} ({min}-{max} content lines). Current content lines: {}.\n",
        document.subject,
        document.body,
        length.as_str(),
        document.content_lines(),
    )
}

/// System prompt for the localization stage
pub fn localize_system_prompt(region: Region) -> String {
    format!(
        "You are an expert in cultural localization of professional emails in Spanish.\n\n\
         YOUR ONLY TASK: adapt vocabulary, greetings, closings, and expressions to the target country.\n\
         Do NOT change the meaning, the length, or the formality (tú/usted).\n\
         Do NOT add or remove information.\n\
         Localize SUBTLY: it must sound natural, never like a caricature of the country.\n\
         FORBIDDEN: filler words, stereotypes, street slang, written accents.\n\n\
         REGIONAL PROFILE:\n{}\n\n\
         {JSON_SUBJECT_BODY}",
        region_profile(region)
    )
}

pub fn localize_user_prompt(document: &Document, region: Region) -> String {
    format!(
        "Email to localize:\n\nSubject: {}\n\nBody:\n{}\n\nLocalize for {region}.\n",
        document.subject, document.body
    )
}

/// System prompt for the final validation stage
pub fn validate_system_prompt(target: Register, region: &RegionSetting) -> String {
    let register = match target {
        Register::Formal => "USTED (usted/le/su)",
        Register::Informal => "TÚ (tú/te/tu)",
    };
    format!(
        "You are the final proofreader of professional emails in Spanish.\n\n\
         YOUR ONLY TASK: check and fix two specific problems.\n\n\
         1. MIXED FORMALITY:\n\
         \x20  - Detect whether the email mixes tú/te/tu with usted/le/su.\n\
         \x20  - If it does, unify everything to {register}.\n\
         \x20  - If it does not, change nothing.\n\n\
         2. REGIONAL INCONSISTENCY ({region}):\n\
         \x20  - Detect expressions clearly wrong for the region.\n\
         \x20  - Fix only the obviously out-of-place ones; do not restyle.\n\n\
         Do NOT change the meaning, the length, or the structure.\n\
         If the email is fine, return it exactly as it is.\n\n\
         {JSON_SUBJECT_BODY_CORRECTIONS}",
        region = region.label(),
    )
}

pub fn validate_user_prompt(document: &Document, formality: Formality, region: &RegionSetting) -> String {
    format!(
        "Subject: {}\n\nBody:\n{}\n\nFormality preference: {}\nRegion: {}\n\nValidate and fix if needed.\n",
        document.subject,
        document.body,
        formality.as_str(),
        region.label(),
    )
}

/// System prompt for the streamed plain-text generation
pub fn stream_system_prompt(recipient_name: &str, sender_name: &str) -> String {
    format!(
        "You are an expert assistant for writing professional emails in Spanish.\n\n\
         Mandatory rules:\n\
         - Return ONLY the final email, no explanations, no quotes.\n\
         - First line: \"Asunto: \" followed by the subject.\n\
         - Salutation: Hola, {recipient_name}:\n\
         - Professional, clear tone.\n\
         - End with:\n\nAtentamente,\n{sender_name}"
    )
}

pub fn stream_user_prompt(request: &PipelineRequest) -> String {
    format!(
        "INSTRUCTION:\n<<<\n{}\n>>>\n\nSENDER: {}\nRECIPIENT: {}",
        request.instruction, request.sender_name, request.recipient_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StyleConfig;

    fn request() -> PipelineRequest {
        PipelineRequest {
            style: StyleConfig::default(),
            instruction: "Solicitar la factura de marzo".to_string(),
            sender_name: "Laura".to_string(),
            recipient_name: "Pedro".to_string(),
            sender_role: Some("Compras".to_string()),
            recipient_role: None,
            original_message: None,
        }
    }

    #[test]
    fn test_draft_prompt_includes_roles_and_style() {
        let prompt = draft_user_prompt(&request());
        assert!(prompt.contains("Sender: Laura (Compras)"));
        assert!(prompt.contains("Recipient: Pedro\n"));
        assert!(prompt.contains("Formality preference: auto"));
        assert!(!prompt.contains("must answer"));
    }

    #[test]
    fn test_reply_prompt_quotes_original() {
        let mut req = request();
        req.style.mode = Mode::Reply;
        req.original_message = Some("¿Nos envía la factura?".to_string());
        let prompt = draft_user_prompt(&req);
        assert!(prompt.contains("must answer it:\n---\n¿Nos envía la factura?\n---"));
    }

    #[test]
    fn test_draft_system_prompt_carries_persona() {
        let prompt = draft_system_prompt(Tone::Firm, Persona::Empathetic);
        assert!(prompt.contains(persona_directive(Persona::Empathetic)));
        assert!(prompt.contains("TONE: FIRM"));
    }

    #[test]
    fn test_length_prompt_states_band() {
        let prompt = length_system_prompt(LengthTier::Complete);
        assert!(prompt.contains("between 12 and 18 lines"));
    }
}
