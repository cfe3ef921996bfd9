//! Built-in framing templates.
//!
//! Placeholders: `{name}`, `{game}`, `{setup}`, `{deck}`, `{order}`,
//! `{contract}`.

/// Framing used for a party's very first prompt
pub const INITIAL_FRAMING_DEFAULT: &str = r#"You are simulating a game of {game} via text. You are acting as {name}, not as a judge: you play like a real player.

Initial game setup:
{setup}

# Decklist (for your reference; you must only use cards from your hand):
{deck}

You will play {order} as {name}.

When you respond, output exactly ONE JSON object.
{contract}

Your "memory" field must at minimum summarize:
  1. Your current hand (which cards you hold), removing any cards you used.
  2. Your active piece and its stats.
  3. Your reserve pieces and their stats.
  4. The specific action you are taking this turn.

You must only play cards that are currently in your hand. Do not reference or use any other cards.

Now begin your move."#;

/// Framing used for every later prompt
pub const CONTINUATION_FRAMING_DEFAULT: &str = r#"Continue simulating {game} as {name}, not a judge.

Decide what information is critical to the game state, then output exactly ONE JSON object.
{contract}

Your "memory" field must at minimum summarize:
  1. Your current hand (removing cards you used).
  2. Your active piece and its stats.
  3. Your reserve pieces and their stats.
  4. The specific action you are taking this turn.

You must only play cards that are currently in your hand. Do not reference or use any other cards.

Then continue with your move."#;

/// Marker placed at the top of the first prompt of a new turn
pub const PHASE_ENTRY_MARKER: &str = "[New Turn]";

/// Note attached when the operator refuses an end of turn
pub const END_TURN_CORRECTION: &str =
    "Please continue your turn; I think you ended prematurely.";

/// Substitutes `{key}` placeholders in one pass over the template.
///
/// Unknown placeholders are left in place, and substituted text is never
/// scanned again, so a setup that mentions `{deck}` stays literal.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fills_known_placeholders() {
        let text = render("{name} plays {order} {unknown}", &[("name", "Ash"), ("order", "first")]);
        assert_eq!(text, "Ash plays first {unknown}");
    }

    #[test]
    fn substituted_text_is_not_rendered_again() {
        let text = render(
            "{setup} / {deck}",
            &[("setup", "my notes say {deck} and {order}"), ("deck", "20 Energy")],
        );
        assert_eq!(text, "my notes say {deck} and {order} / 20 Energy");
    }

    #[test]
    fn stray_braces_survive() {
        let text = render("{{name}} {name", &[("name", "Ash")]);
        assert_eq!(text, "{Ash} {name");
    }

    #[test]
    fn defaults_mention_every_placeholder() {
        for key in ["{name}", "{game}", "{setup}", "{deck}", "{order}", "{contract}"] {
            assert!(INITIAL_FRAMING_DEFAULT.contains(key), "initial framing lacks {key}");
        }
        assert!(CONTINUATION_FRAMING_DEFAULT.contains("{contract}"));
    }
}
