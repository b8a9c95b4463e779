//! JavaScript evaluated in the page by the browser extractor
//!
//! `CRITICAL_CSS_SCRIPT` is a function expression; callers apply it to a JSON
//! payload with [`critical_css_call`].

use serde::Serialize;

/// Readiness probe polled after navigation
pub const READY_STATE_SCRIPT: &str = r#"
    (() => ({
        readyState: document.readyState,
        bodyExists: document.body !== null,
        fontsReady: !document.fonts || document.fonts.status === 'loaded'
    }))()
"#;

/// Keeps the rules of `opts.css` that style content above the fold
///
/// Returns `{ css }` on success and `{ error }` when the stylesheet cannot be
/// parsed by the browser.
pub const CRITICAL_CSS_SCRIPT: &str = r#"
    (opts) => {
        const sheet = new CSSStyleSheet();
        try {
            sheet.replaceSync(opts.css);
        } catch (e) {
            return { error: 'stylesheet rejected: ' + e.message };
        }

        const toMatcher = (text) => {
            const last = text.lastIndexOf('/');
            if (text.length > 2 && text[0] === '/' && last > 0) {
                try {
                    return new RegExp(text.slice(1, last), text.slice(last + 1));
                } catch (_) {}
            }
            return text;
        };
        const forced = (opts.forceInclude || []).map(toMatcher);
        const removeProps = (opts.propertiesToRemove || []).map((p) => new RegExp(p));
        const pseudo = /::?(before|after|first-line|first-letter|selection|placeholder|marker|backdrop|-webkit-[\w-]+|-moz-[\w-]+)|:(hover|focus|focus-within|focus-visible|active|visited|target)/gi;
        const usedAnimations = new Set();

        const isForced = (sel) =>
            forced.some((f) => (typeof f === 'string' ? f === sel : f.test(sel)));

        const splitSelectors = (text) => {
            const out = [];
            let depth = 0, quote = null, start = 0;
            for (let i = 0; i < text.length; i++) {
                const c = text[i];
                if (quote) {
                    if (c === '\\') i++;
                    else if (c === quote) quote = null;
                } else if (c === '"' || c === "'") quote = c;
                else if (c === '(' || c === '[') depth++;
                else if (c === ')' || c === ']') depth--;
                else if (c === ',' && depth === 0) {
                    out.push(text.slice(start, i).trim());
                    start = i + 1;
                }
            }
            out.push(text.slice(start).trim());
            return out.filter(Boolean);
        };

        const aboveFold = (sel) => {
            if (isForced(sel)) return true;
            let cleaned = sel.replace(pseudo, '').trim();
            if (!cleaned || /[>+~]$/.test(cleaned)) cleaned = (cleaned + ' *').trim();
            if (/^[>+~]/.test(cleaned)) cleaned = '*' + cleaned;
            let nodes;
            try {
                nodes = document.querySelectorAll(cleaned);
            } catch (_) {
                return false;
            }
            for (const el of nodes) {
                if (el.getBoundingClientRect().top < opts.height) return true;
            }
            return false;
        };

        const declarations = (style) => {
            if (removeProps.length) {
                const doomed = [];
                for (let i = 0; i < style.length; i++) {
                    if (removeProps.some((re) => re.test(style[i]))) doomed.push(style[i]);
                }
                doomed.forEach((p) => style.removeProperty(p));
            }
            if (style.animationName) {
                style.animationName.split(',').forEach((n) => usedAnimations.add(n.trim()));
            }
            return style.cssText;
        };

        const mediaApplies = (media) => {
            const text = media.mediaText.toLowerCase();
            if (/^\s*print\s*$/.test(text)) return false;
            if (!opts.keepLargerMediaQueries) {
                const min = /min-width\s*:\s*([\d.]+)px/.exec(text);
                if (min && parseFloat(min[1]) > opts.width) return false;
            }
            return true;
        };

        const keyframes = [];
        const walk = (rules) => {
            let out = '';
            for (const rule of rules) {
                if (rule instanceof CSSStyleRule) {
                    const kept = splitSelectors(rule.selectorText).filter(aboveFold);
                    if (!kept.length) continue;
                    const body = declarations(rule.style);
                    if (body) out += kept.join(',') + '{' + body + '}';
                } else if (rule instanceof CSSMediaRule) {
                    if (!mediaApplies(rule.media)) continue;
                    const inner = walk(rule.cssRules);
                    if (inner) out += '@media ' + rule.media.mediaText + '{' + inner + '}';
                } else if (typeof CSSSupportsRule !== 'undefined' && rule instanceof CSSSupportsRule) {
                    const inner = walk(rule.cssRules);
                    if (inner) out += '@supports ' + rule.conditionText + '{' + inner + '}';
                } else if (rule instanceof CSSFontFaceRule) {
                    out += rule.cssText;
                } else if (rule instanceof CSSKeyframesRule) {
                    keyframes.push(rule);
                }
            }
            return out;
        };

        let css = walk(sheet.cssRules);
        for (const rule of keyframes) {
            if (usedAnimations.has(rule.name)) css += rule.cssText;
        }
        return { css };
    }
"#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CriticalCssPayload<'a> {
    pub css: &'a str,
    pub width: u32,
    pub height: u32,
    pub force_include: &'a [String],
    pub keep_larger_media_queries: bool,
    pub properties_to_remove: &'a [String],
}

/// Expression applying [`CRITICAL_CSS_SCRIPT`] to `payload`
pub(crate) fn critical_css_call(payload: &CriticalCssPayload<'_>) -> serde_json::Result<String> {
    let json = serde_json::to_string(payload)?;
    Ok(format!("({CRITICAL_CSS_SCRIPT})({json})"))
}
