//! Keyword intent routing
//!
//! Maps a recognized utterance to one of a fixed set of categories and its
//! canned response. Rules are checked in table order and the first match
//! wins, so vocabulary shared between categories resolves to the earlier
//! rule.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Anchor of the contact section on the page
pub const CONTACT_SECTION: &str = "contacto";

/// Response used when no rule matches
pub const FALLBACK_RESPONSE: &str = "Entiendo. Lo mejor sería charlarlo en una videollamada rápida para no perder tiempo. ¿Te parece bien si agendamos?";

/// Category inferred from an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentCategory {
    Greeting,
    WebServices,
    Pricing,
    SchedulingDemo,
    Timeline,
    Contact,
    Fallback,
}

impl IntentCategory {
    /// Stable lowercase name, used in logs and CLI output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::WebServices => "web_services",
            Self::Pricing => "pricing",
            Self::SchedulingDemo => "scheduling_demo",
            Self::Timeline => "timeline",
            Self::Contact => "contact",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side effect requested by a routed intent
///
/// The router only describes it; the session forwards it to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    /// Scroll the page to the named section
    ScrollTo(&'static str),
}

/// A single recognized user statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    raw: String,
    normalized: String,
}

impl Utterance {
    /// Wrap a raw transcript, lowercasing it for matching
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = raw.to_lowercase();
        Self { raw, normalized }
    }

    /// Transcript as recognized
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lowercased transcript used for matching
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// One entry of the routing table
#[derive(Debug)]
pub struct Rule {
    /// Category this rule resolves to
    pub category: IntentCategory,
    /// Keyword alternation, matched anywhere in the normalized text
    pub pattern: Regex,
    /// Canned response for the category
    pub response: &'static str,
    /// Optional side effect for the host page
    pub side_effect: Option<SideEffect>,
}

/// Outcome of routing one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routed {
    pub category: IntentCategory,
    pub response: &'static str,
    pub side_effect: Option<SideEffect>,
}

/// Keyword groups in evaluation order
const RULE_TABLE: &[(IntentCategory, &str, &str, Option<SideEffect>)] = &[
    (
        IntentCategory::Greeting,
        "hola|inicio|comenzar|buenos días|buenas tardes",
        "¡Hola! Soy el asistente de JJ TECH. Puedo ayudarte a agendar una demo en minutos y explicarte cómo llevar tu negocio al siguiente nivel. ¿Qué tienes en mente?",
        None,
    ),
    (
        IntentCategory::WebServices,
        "web|página|sitio|internet|online|ecommerce|tienda",
        "Creamos webs que venden por ti, 24/7. Nada de plantillas aburridas. ¿Te gustaría ver una demo de lo que podemos hacer?",
        None,
    ),
    (
        IntentCategory::Pricing,
        "precio|costo|cuánto vale|cotización|presupuesto|dinero",
        "Nuestros servicios inician desde 500.000 pesos colombianos. Una inversión pequeña para el retorno que obtendrás. ¿Agendamos una videollamada para darte una cotización exacta?",
        None,
    ),
    (
        IntentCategory::SchedulingDemo,
        "demo|videollamada|reunión|cita|agendar|ver",
        "¡Excelente decisión! Te conectaré con Juan en una videollamada para mostrarte el potencial. Deja tus datos en el formulario y te enviaremos el link de Zoom de inmediato.",
        Some(SideEffect::ScrollTo(CONTACT_SECTION)),
    ),
    (
        IntentCategory::Timeline,
        "tiempo|cuánto tarda|duración|demora",
        "Trabajamos a la velocidad de la luz. En cuestión de días tendrás tu sistema listo. Agendemos una videollamada para definir cronogramas.",
        None,
    ),
    (
        IntentCategory::Contact,
        "contacto|llamar|correo|email|teléfono",
        "Estamos a un clic de distancia. Escríbenos abajo o di 'agendar' para coordinar una llamada ahora mismo.",
        Some(SideEffect::ScrollTo(CONTACT_SECTION)),
    ),
];

#[allow(clippy::expect_used)]
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    RULE_TABLE
        .iter()
        .map(|&(category, pattern, response, side_effect)| Rule {
            category,
            pattern: Regex::new(pattern).expect("static intent pattern is valid"),
            response,
            side_effect,
        })
        .collect()
});

/// The ordered routing table, excluding the fallback
#[must_use]
pub fn rules() -> &'static [Rule] {
    &RULES
}

/// Route an utterance to its category and response
#[must_use]
pub fn route(utterance: &Utterance) -> Routed {
    let text = utterance.normalized();

    rules()
        .iter()
        .find(|rule| rule.pattern.is_match(text))
        .map_or(
            Routed {
                category: IntentCategory::Fallback,
                response: FALLBACK_RESPONSE,
                side_effect: None,
            },
            |rule| Routed {
                category: rule.category,
                response: rule.response,
                side_effect: rule.side_effect,
            },
        )
}

/// Convenience wrapper around [`route`] for raw text
#[must_use]
pub fn route_text(text: &str) -> Routed {
    let routed = route(&Utterance::new(text));
    tracing::debug!(text, category = %routed.category, "routed utterance");
    routed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_lowercases_only() {
        let utterance = Utterance::new("¡HOLA, Amigo!");
        assert_eq!(utterance.raw(), "¡HOLA, Amigo!");
        assert_eq!(utterance.normalized(), "¡hola, amigo!");
    }

    #[test]
    fn test_table_order() {
        let order: Vec<_> = rules().iter().map(|r| r.category).collect();
        assert_eq!(
            order,
            vec![
                IntentCategory::Greeting,
                IntentCategory::WebServices,
                IntentCategory::Pricing,
                IntentCategory::SchedulingDemo,
                IntentCategory::Timeline,
                IntentCategory::Contact,
            ]
        );
    }

    #[test]
    fn test_uppercase_input_matches() {
        assert_eq!(route_text("PRECIO").category, IntentCategory::Pricing);
    }

    #[test]
    fn test_only_scheduling_and_contact_scroll() {
        for rule in rules() {
            let scrolls = rule.side_effect.is_some();
            let expected = matches!(
                rule.category,
                IntentCategory::SchedulingDemo | IntentCategory::Contact
            );
            assert_eq!(scrolls, expected, "{}", rule.category);
        }
    }
}
