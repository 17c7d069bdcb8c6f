//! Intent knowledge base.
//!
//! Holds the ordered, read-only intent entries and the fallback reply pool.
//! Entries are validated once at construction; query-time code never fails.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use tracing::info;

use crate::error::ChatError;
use crate::normalize::normalize;
use crate::types::{Category, IntentEntry};

// =============================================================================
// Compiled patterns
// =============================================================================

/// A pattern prepared for matching: normalized once, plus a word-bounded regex.
#[derive(Debug, Clone)]
pub(crate) struct CompiledPattern {
    pub(crate) normalized: String,
    pub(crate) bounded: Regex,
}

impl CompiledPattern {
    fn compile(normalized: String) -> Result<Self, ChatError> {
        let bounded = Regex::new(&format!(
            r"(?:^|[^\w]){}(?:[^\w]|$)",
            regex::escape(&normalized)
        ))
        .map_err(|e| ChatError::InvalidKnowledgeBase(format!("pattern {:?}: {}", normalized, e)))?;
        Ok(Self {
            normalized,
            bounded,
        })
    }
}

#[derive(Debug, Clone)]
struct Rule {
    entry: IntentEntry,
    patterns: Vec<CompiledPattern>,
}

// =============================================================================
// KnowledgeBase
// =============================================================================

/// Ordered collection of intent entries plus the fallback reply pool.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    rules: Vec<Rule>,
    fallback: Vec<String>,
}

/// On-disk layout of a knowledge base file.
#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    fallback: Vec<String>,
    #[serde(default)]
    intents: Vec<IntentEntry>,
}

static BUILTIN: LazyLock<Arc<KnowledgeBase>> = LazyLock::new(|| {
    Arc::new(
        KnowledgeBase::new(builtin_entries(), builtin_fallback())
            .expect("built-in knowledge base is valid"),
    )
});

impl KnowledgeBase {
    /// Validate and compile a knowledge base.
    ///
    /// Fails with [`ChatError::InvalidKnowledgeBase`] if there are no entries,
    /// the fallback pool is empty, or any entry has no responses, no patterns,
    /// a pattern that normalizes to nothing, or two patterns that normalize
    /// to the same text.
    pub fn new(entries: Vec<IntentEntry>, fallback: Vec<String>) -> Result<Self, ChatError> {
        if entries.is_empty() {
            return Err(ChatError::InvalidKnowledgeBase(
                "knowledge base has no intent entries".to_string(),
            ));
        }
        if fallback.is_empty() {
            return Err(ChatError::InvalidKnowledgeBase(
                "fallback response pool is empty".to_string(),
            ));
        }

        let mut rules = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.into_iter().enumerate() {
            if entry.patterns.is_empty() {
                return Err(ChatError::InvalidKnowledgeBase(format!(
                    "entry {} ({}) has no patterns",
                    idx, entry.category
                )));
            }
            if entry.responses.is_empty() {
                return Err(ChatError::InvalidKnowledgeBase(format!(
                    "entry {} ({}) has no responses",
                    idx, entry.category
                )));
            }

            let mut seen = HashSet::new();
            let mut patterns = Vec::with_capacity(entry.patterns.len());
            for raw in &entry.patterns {
                let normalized = normalize(raw);
                if normalized.is_empty() {
                    return Err(ChatError::InvalidKnowledgeBase(format!(
                        "entry {} ({}) has a blank pattern",
                        idx, entry.category
                    )));
                }
                if !seen.insert(normalized.clone()) {
                    return Err(ChatError::InvalidKnowledgeBase(format!(
                        "entry {} ({}) repeats pattern {:?}",
                        idx, entry.category, raw
                    )));
                }
                patterns.push(CompiledPattern::compile(normalized)?);
            }

            rules.push(Rule { entry, patterns });
        }

        Ok(Self { rules, fallback })
    }

    /// The PsicoAdmin knowledge base, built once per process.
    pub fn builtin() -> Arc<KnowledgeBase> {
        Arc::clone(&BUILTIN)
    }

    /// Parse a knowledge base from TOML text.
    ///
    /// A missing `fallback` array keeps the built-in fallback pool.
    pub fn from_toml_str(content: &str) -> Result<Self, ChatError> {
        let file: KnowledgeFile = toml::from_str(content)
            .map_err(|e| ChatError::InvalidKnowledgeBase(e.to_string()))?;
        let fallback = if file.fallback.is_empty() {
            builtin_fallback()
        } else {
            file.fallback
        };
        Self::new(file.intents, fallback)
    }

    /// Load a knowledge base from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let content = std::fs::read_to_string(path).map_err(psico_core::PsicoError::from)?;
        let kb = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            intents = kb.len(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &IntentEntry> {
        self.rules.iter().map(|r| &r.entry)
    }

    /// Replies used when no entry matches.
    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn rules(&self) -> impl Iterator<Item = (&IntentEntry, &[CompiledPattern])> {
        self.rules.iter().map(|r| (&r.entry, r.patterns.as_slice()))
    }
}

// =============================================================================
// Built-in content
// =============================================================================

fn builtin_entries() -> Vec<IntentEntry> {
    vec![
        IntentEntry::new(
            Category::Greeting,
            ["hola", "buenos días", "buenas tardes", "buenas noches", "hey", "saludos"],
            [
                "¡Hola! 👋 Soy tu asistente virtual de PsicoAdmin. ¿En qué puedo ayudarte hoy?",
                "¡Bienvenido! Estoy aquí para ayudarte con cualquier duda sobre nuestro sistema.",
                "¡Hola! ¿Necesitas ayuda con el agendamiento de citas o información sobre nuestros servicios?",
            ],
        ),
        IntentEntry::new(
            Category::Appointment,
            ["agendar", "cita", "reservar", "turno", "hora", "disponibilidad", "cupo"],
            [
                "Para agendar una cita: 1) Ve a \"Profesionales\" 2) Selecciona tu psicólogo preferido 3) Elige fecha y hora disponible 4) Confirma tu reserva. ¿Necesitas ayuda con algún paso específico?",
                "Puedes agendar tu cita desde la sección \"Profesionales\". Verás el calendario de disponibilidad de cada psicólogo. ¿Quieres que te guíe paso a paso?",
            ],
        ),
        IntentEntry::new(
            Category::Payment,
            ["pagar", "pago", "precio", "costo", "tarjeta", "stripe", "cobro"],
            [
                "Los pagos se procesan de forma segura a través de Stripe. Después de agendar tu cita, serás redirigido al checkout donde podrás pagar con tarjeta. ¿Tienes alguna duda sobre el proceso?",
                "Aceptamos pagos con tarjeta de crédito/débito a través de Stripe. El precio depende del profesional que elijas. ¿Necesitas más información?",
            ],
        ),
        IntentEntry::new(
            Category::Documents,
            ["documento", "descargar", "archivo", "pdf", "informe", "material"],
            [
                "Puedes ver y descargar todos tus documentos clínicos en la sección \"Mis Documentos\". Tus psicólogos subirán allí material de apoyo e informes. ¿Necesitas ayuda para encontrar algo?",
                "En \"Mis Documentos\" encontrarás todo el material que tus profesionales te han compartido. Puedes descargarlo haciendo clic en el botón \"Descargar\". ¿Hay algo específico que busques?",
            ],
        ),
        IntentEntry::new(
            Category::Professionals,
            ["psicólogo", "profesional", "terapeuta", "especialista", "doctor"],
            [
                "Contamos con profesionales especializados en diferentes áreas. Puedes ver sus perfiles, especialidades y disponibilidad en la sección \"Profesionales\". ¿Buscas alguna especialidad en particular?",
                "Todos nuestros psicólogos están certificados y cuentan con amplia experiencia. En la sección \"Profesionales\" puedes ver su información, reseñas y horarios disponibles.",
            ],
        ),
        IntentEntry::new(
            Category::History,
            ["historial", "historia clínica", "expediente", "antecedentes", "registro"],
            [
                "Tu historial clínico es confidencial y solo accesible para ti y tus profesionales asignados. Contiene notas de sesión, diagnósticos y evolución de tu tratamiento.",
                "El historial clínico se actualiza después de cada sesión. Tu psicólogo registra notas importantes que ayudan a dar seguimiento a tu proceso terapéutico.",
            ],
        ),
        IntentEntry::new(
            Category::Profile,
            ["perfil", "cuenta", "contraseña", "email", "datos", "información personal"],
            [
                "Puedes actualizar tu información personal en la sección \"Mi Perfil\". Allí también puedes cambiar tu contraseña y foto de perfil.",
                "Para modificar tus datos: Ve a \"Mi Perfil\" → Edita la información que necesites → Guarda los cambios. ¿Necesitas ayuda específica con algo?",
            ],
        ),
        IntentEntry::new(
            Category::Help,
            ["ayuda", "help", "no entiendo", "no funciona", "error", "problema"],
            [
                "Estoy aquí para ayudarte. ¿Podrías contarme más detalles sobre lo que necesitas? Por ejemplo: ¿quieres agendar una cita, ver documentos, o tienes un problema técnico?",
                "Claro, con gusto te ayudo. ¿Es sobre: agendamiento de citas, pagos, documentos, o algo más? Cuéntame para orientarte mejor.",
            ],
        ),
        IntentEntry::new(
            Category::Farewell,
            ["gracias", "bye", "adiós", "chao", "hasta luego", "ok gracias"],
            [
                "¡De nada! Si necesitas más ayuda, aquí estaré. Que tengas un excelente día. 😊",
                "¡Un placer ayudarte! No dudes en volver si necesitas algo más. ¡Cuídate! 👋",
                "¡Gracias a ti! Estoy disponible cuando me necesites. ¡Hasta pronto! ✨",
            ],
        ),
    ]
}

fn builtin_fallback() -> Vec<String> {
    [
        "Interesante pregunta. ¿Podrías reformularla? Por ejemplo: \"¿Cómo agendar una cita?\" o \"¿Dónde veo mis documentos?\"",
        "No estoy seguro de haber entendido. ¿Tu pregunta es sobre citas, pagos, documentos o profesionales?",
        "Hmm, no encontré información específica sobre eso. ¿Podrías ser más específico? Puedo ayudarte con: citas, pagos, documentos, perfil.",
        "Esa es una buena pregunta, pero necesito más contexto. ¿Es sobre el uso de la plataforma? Cuéntame más detalles.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
