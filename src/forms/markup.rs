//! Color markup for form descriptions.
//!
//! Substitutes `{name}...{/name}` tag pairs with terminal styling, working
//! innermost-first so nested tags compose. Color names are case-insensitive;
//! the basic eight colors, their `hi` prefixed high-intensity variants and
//! `bold` are recognized. Unrecognized tags are erased, leaving the inner
//! text.

use console::Style;

/// Parses a string with color markup tags and returns a colorized string.
pub fn color_markup(input: &str) -> String {
    let mut result = input.to_string();

    loop {
        let mut changed = false;

        let opens: Vec<usize> = result
            .char_indices()
            .filter(|(_, c)| *c == '{')
            .map(|(i, _)| i)
            .collect();

        for open in opens {
            let Some(close_rel) = result[open..].find('}') else {
                continue;
            };
            let close = open + close_rel;
            let name = &result[open + 1..close];

            // a closing tag, not an opening one
            if name.contains('/') {
                continue;
            }

            let close_tag = format!("{{/{}}}", name);
            let Some(end_rel) = result[close + 1..].find(&close_tag) else {
                continue;
            };
            let end = close + 1 + end_rel;
            let content = &result[close + 1..end];

            // defer until inner opening tags are resolved
            if let Some(brace) = content.find('{') {
                if !content[brace..].trim_start().starts_with('/') {
                    continue;
                }
            }

            let full = result[open..end + close_tag.len()].to_string();
            let replacement = match style_for(&name.to_lowercase()) {
                Some(style) => style.apply_to(content).to_string(),
                None => content.to_string(),
            };

            result = result.replacen(&full, &replacement, 1);
            changed = true;
            break;
        }

        if !changed {
            break;
        }
    }

    result
}

fn style_for(name: &str) -> Option<Style> {
    let style = match name {
        "bold" => Style::new().bold(),
        "black" => Style::new().black(),
        "red" => Style::new().red(),
        "green" => Style::new().green(),
        "yellow" => Style::new().yellow(),
        "blue" => Style::new().blue(),
        "magenta" => Style::new().magenta(),
        "cyan" => Style::new().cyan(),
        "white" => Style::new().white(),
        "hiblack" => Style::new().black().bright(),
        "hired" => Style::new().red().bright(),
        "higreen" => Style::new().green().bright(),
        "hiyellow" => Style::new().yellow().bright(),
        "hiblue" => Style::new().blue().bright(),
        "himagenta" => Style::new().magenta().bright(),
        "hicyan" => Style::new().cyan().bright(),
        "hiwhite" => Style::new().white().bright(),
        _ => return None,
    };

    Some(style)
}
