//! Terminal presentation: visible transcript, quick actions, and commands.

use chrono::Local;
use psico_chat::{Role, Turn};

/// Opening message shown before the user types anything.
pub const WELCOME: &str =
    "¡Hola! 👋 Soy tu asistente virtual de PsicoAdmin. ¿En qué puedo ayudarte hoy?";

/// Canned questions offered as shortcuts.
pub const QUICK_ACTIONS: [(&str, &str); 4] = [
    ("📅", "¿Cómo agendar una cita?"),
    ("📄", "¿Dónde veo mis documentos?"),
    ("💳", "¿Cómo pagar?"),
    ("👨‍⚕️", "Ver profesionales"),
];

/// Shown while a reply is pending.
pub const COMPOSING: &str = "Asistente está escribiendo…";

/// What a line of input asks the front end to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Blank line.
    Empty,
    /// Send the text to the assistant.
    Say(String),
    /// Print the session context as JSON.
    ShowContext,
    /// Print the quick actions again.
    ShowActions,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        match trimmed {
            "/salir" | "/exit" | "/quit" => return Command::Quit,
            "/contexto" => return Command::ShowContext,
            "/atajos" | "/ayuda" => return Command::ShowActions,
            _ => {}
        }
        if let Some(n) = trimmed.strip_prefix('/').and_then(|s| s.parse::<usize>().ok()) {
            if let Some((_, text)) = n.checked_sub(1).and_then(|i| QUICK_ACTIONS.get(i)) {
                return Command::Say(text.to_string());
            }
        }
        Command::Say(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// The messages shown on screen, starting with the welcome message.
#[derive(Debug)]
pub struct Transcript {
    messages: Vec<Turn>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            messages: vec![Turn::bot(WELCOME)],
        }
    }

    /// Append a message and return its rendered line.
    pub fn push(&mut self, turn: Turn) -> String {
        let line = render(&turn);
        self.messages.push(turn);
        line
    }

    pub fn messages(&self) -> &[Turn] {
        &self.messages
    }
}

/// One transcript line; user and bot messages are styled differently.
pub fn render(turn: &Turn) -> String {
    let time = turn.timestamp.with_timezone(&Local).format("%H:%M");
    match turn.role {
        Role::User => format!("[{}] \x1b[36mTú ›\x1b[0m {}", time, turn.text),
        Role::Bot => format!("[{}] \x1b[35mAsistente ›\x1b[0m {}", time, turn.text),
    }
}

/// Numbered quick-action menu.
pub fn render_actions() -> String {
    let mut lines = vec!["Atajos rápidos:".to_string()];
    for (i, (emoji, text)) in QUICK_ACTIONS.iter().enumerate() {
        lines.push(format!("  /{} {} {}", i + 1, emoji, text));
    }
    lines.push("  /contexto  muestra el contexto  ·  /salir  termina".to_string());
    lines.join("\n")
}
