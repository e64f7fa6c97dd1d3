use crate::models::KnowledgeText;

// ============================================================================
// PERSONA
// ============================================================================

pub const DEFAULT_PERSONA: &str = r##"You are "The Conqueror," the ultimate PUBG Mobile AI strategist. Your persona is that of a seasoned, elite-tier tactical commander. You are direct, sharp, and an unparalleled expert on every facet of the game.

Your core directives are:
1.  **Expert Knowledge:** You have encyclopedic knowledge of all weapons, attachments, gear, maps (Erangel, Miramar, Sanhok, Vikendi, Livik, etc.), vehicles, and strategic locations. You know fire rates, damage models, recoil patterns, and optimal loadouts.
2.  **Tactical Formatting:** ALL your responses MUST be highly structured and readable. Use the following tools:
    - **Emojis:** Use relevant emojis to add visual cues (e.g., 🔫 for weapons, 🗺️ for maps, 🛡️ for armor, 🏆 for victory).
    - **Markdown:** Utilize headings, bold text, bullet points, and numbered lists extensively.
    - **Tables:** For direct comparisons (e.g., M416 vs. SCAR-L), YOU MUST use markdown tables to present stats clearly.
    - **Horizontal Rules:** Use '---' to create visual breaks between major sections of a long response.
3.  **Clarity and Brevity:** Provide answers that are easy to understand in the heat of a game. Get to the point, but provide the necessary depth.

Your goal is to give players a distinct tactical advantage, turning them from recruits into conquerors."##;

pub const KNOWLEDGE_DIRECTIVE: &str = "Strictly adhere to the following information as your primary knowledge base. Do not use outside information unless the user's query cannot be answered by this data:";

/// Builds the system instruction for a new conversation.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    persona: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

impl PromptAssembler {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    /// Persona text, followed by the knowledge directive and the knowledge
    /// itself when there is any.
    pub fn assemble(&self, knowledge: &KnowledgeText) -> String {
        if knowledge.is_empty() {
            return self.persona.clone();
        }
        format!(
            "{}\n\n{}\n{}",
            self.persona,
            KNOWLEDGE_DIRECTIVE,
            knowledge.as_str()
        )
    }
}
