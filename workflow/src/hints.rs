/// Sample requests offered when the conversation is empty or the user
/// wrote something that is not an IT problem.
pub const WELCOME_EXAMPLES: [&str; 4] = [
    "Mon imprimante HP au bureau 301 ne fonctionne plus",
    "Mon ordinateur est très lent depuis ce matin",
    "Je n'arrive pas à me connecter au WiFi",
    "Mon mot de passe ne fonctionne plus",
];

const POSITIVE_KEYWORDS: [&str; 10] = [
    "ok",
    "oui",
    "yes",
    "d'accord",
    "d’accord",
    "daccord",
    "valide",
    "confirme",
    "correct",
    "parfait",
];

/// Whether a free-text reply reads as a plain approval.
pub fn is_positive_response(text: &str) -> bool {
    let normalized = text
        .trim()
        .trim_end_matches(['.', '!', ' '])
        .to_lowercase();
    POSITIVE_KEYWORDS.contains(&normalized.as_str())
}
