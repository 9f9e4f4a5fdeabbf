//! Ordered, regex-based intent rules.
//!
//! Rules are evaluated top to bottom and the first rule that claims an
//! utterance wins. A rule claims an utterance when its regex matches and its
//! extractor accepts the captures; an extractor returning `None` lets
//! matching fall through to later rules. The table is grouped by
//! [`PrecedenceGroup`] and must stay sorted by group.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::intent::arithmetic::prepare_expression;
use crate::types::{Intent, IntentKind, MediaCommand, PowerAction, PrecedenceGroup};

/// Conversation state that some rules consult.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchContext {
    /// Recent transcript mentions music or other media.
    pub media_context: bool,
}

/// The utterance as seen by an extractor.
pub struct RuleInput<'a> {
    /// Normalized text with original casing.
    pub text: &'a str,
    /// Lowercased copy of `text`.
    pub lower: &'a str,
    pub context: &'a MatchContext,
}

type Params = Vec<(&'static str, String)>;
type Extractor = fn(&Captures<'_>, &RuleInput<'_>) -> Option<Params>;

/// A single compiled rule linked to an intent kind.
pub struct IntentRule {
    pub name: &'static str,
    pub group: PrecedenceGroup,
    pub kind: IntentKind,
    regex: Regex,
    extract: Extractor,
}

impl IntentRule {
    fn new(
        name: &'static str,
        group: PrecedenceGroup,
        kind: IntentKind,
        pattern: &str,
        extract: Extractor,
    ) -> Self {
        Self {
            name,
            group,
            kind,
            regex: Regex::new(pattern).expect("Invalid intent regex"),
            extract,
        }
    }

    fn apply(&self, input: &RuleInput<'_>) -> Option<Intent> {
        let caps = self.regex.captures(input.text)?;
        let params = (self.extract)(&caps, input)?;
        Some(
            params
                .into_iter()
                .fold(Intent::new(self.kind, input.text), |intent, (k, v)| {
                    intent.with_param(k, v)
                }),
        )
    }
}

// =============================================================================
// Shared vocabularies
// =============================================================================

/// Keywords that disqualify an utterance from arithmetic evaluation.
static ARITHMETIC_EXCLUSIONS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:time|date|day|weather|system|status|cpu|ram|memory|uptime|name|note|notes|file|folder)\b",
    )
    .expect("Invalid arithmetic exclusion regex")
});

static TIMER_DESCRIPTION_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:called|named|for|regarding|labell?ed)\s+")
        .expect("Invalid timer description regex")
});

static MEDIA_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:music|songs?|tracks?|tunes?|sound|audio|video|media|playback|playlist|spotify)\b")
        .expect("Invalid media keyword regex")
});

/// First words of a search query that belong to other commands.
const RESERVED_SEARCH_WORDS: &[&str] = &[
    "open", "launch", "close", "quit", "list", "create", "copy", "paste", "type", "timer",
    "timers", "calculate", "weather", "roll", "flip", "joke", "uptime", "lock", "shutdown",
    "restart", "logout", "note", "notes", "clipboard", "volume", "gui", "interface", "help",
    "time", "date", "day", "stats", "internet", "play", "pause",
];

const ARTICLES: &[&str] = &["the", "a", "an", "my", "your"];

/// Nouns that name something other than an application.
const NON_APPLICATION_NOUNS: &[&str] = &[
    "tab", "tabs", "window", "windows", "file", "files", "document", "folder", "directory",
    "website", "url", "link", "page", "timer", "timers", "note", "notes", "gui", "interface",
    "session", "settings", "preferences",
];

/// Whole-target words that are never an application or window.
const PRONOUN_TARGETS: &[&str] = &[
    "me", "this", "that", "it", "here", "the", "a", "an", "my", "some", "current", "everything",
];

/// Document extensions that make a dotted token a file rather than a site.
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "txt", "doc", "docx", "pdf", "xls", "xlsx", "ppt", "pptx", "csv", "md", "rtf", "odt", "png",
    "jpg", "jpeg", "gif", "mp3", "mp4", "zip", "exe", "py", "rs", "json",
];

// =============================================================================
// PatternSet
// =============================================================================

/// The complete rule table, compiled once and reused.
pub struct PatternSet {
    rules: Vec<IntentRule>,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternSet {
    /// Create a new PatternSet with all compiled rules.
    pub fn new() -> Self {
        use IntentKind as K;
        use PrecedenceGroup as G;

        let rules = vec![
            // =================================================================
            // Interface launch
            // =================================================================
            IntentRule::new(
                "launch_interface",
                G::Interface,
                K::LaunchInterface,
                r"(?i)\b(?:open|show|launch|start)\s+(?:the\s+)?(?:gui|interface)\b|\bgraphical\s+mode\b",
                no_params,
            ),
            // =================================================================
            // Timers
            // =================================================================
            IntentRule::new(
                "cancel_all_timers",
                G::Timers,
                K::CancelAllTimers,
                r"(?i)\b(?:cancel|clear|stop|delete|remove)\s+(?:all\s+(?:of\s+)?(?:the\s+|my\s+)?timers?|(?:the\s+|my\s+)?timers)\b",
                no_params,
            ),
            IntentRule::new(
                "set_timer",
                G::Timers,
                K::SetTimer,
                r"(?i)(?:\b(?:set|start|create|new)\s+(?:a\s+|an\s+|another\s+)?timer\s+(?:for\s+|of\s+)?|^timer\s+(?:for\s+)?)(?P<spec>.+)$",
                extract_set_timer,
            ),
            IntentRule::new(
                "cancel_timer",
                G::Timers,
                K::CancelTimer,
                r"(?i)\b(?:cancel|stop|delete|remove|clear)\s+(?:the\s+|my\s+)?(?:(?P<before>[\w'-]+(?:\s+[\w'-]+)*?)\s+)?timer\b(?:\s+(?P<after>.+?))?\s*[.!]?$",
                extract_cancel_timer,
            ),
            // =================================================================
            // Arithmetic
            // =================================================================
            IntentRule::new(
                "calculate",
                G::Arithmetic,
                K::Calculate,
                r"(?i)\b(?:what\s+is|what's|whats|calculate|compute|evaluate|solve|maths?|calc)\b[:\s]*(?P<expr>.+)$",
                extract_calculation,
            ),
            // =================================================================
            // Weather
            // =================================================================
            IntentRule::new(
                "weather",
                G::Weather,
                K::Weather,
                r"(?i)\bweather\b(?:\s+like)?(?:\s+(?:today|now|tomorrow))?\s+(?:in|for|at)\s+(?P<location>[^?!.]+)",
                extract_weather,
            ),
            // =================================================================
            // Fun and utility
            // =================================================================
            IntentRule::new(
                "roll_dice",
                G::Fun,
                K::RollDice,
                r"(?i)\broll\s+(?:a\s+|the\s+)?(?:die|dice)\b",
                no_params,
            ),
            IntentRule::new(
                "flip_coin",
                G::Fun,
                K::FlipCoin,
                r"(?i)\b(?:flip|toss)\s+(?:a\s+|the\s+)?coin\b",
                no_params,
            ),
            IntentRule::new(
                "tell_joke",
                G::Fun,
                K::TellJoke,
                r"(?i)\b(?:tell\s+(?:me\s+)?(?:a\s+|another\s+)?joke|make\s+me\s+laugh|say\s+something\s+funny)\b",
                no_params,
            ),
            IntentRule::new(
                "random_number",
                G::Fun,
                K::RandomNumber,
                r"(?i)\b(?:random|pick\s+a)\s+number\s+(?:between|from)\s+(?P<min>-?\d+)\s+(?:and|to)\s+(?P<max>-?\d+)\b",
                extract_random_range,
            ),
            // =================================================================
            // System introspection
            // =================================================================
            IntentRule::new(
                "system_uptime",
                G::Introspection,
                K::SystemUptime,
                r"(?i)\b(?:uptime|how\s+long\s+(?:has\s+)?(?:the\s+|my\s+)?(?:system|computer|pc)\s+been\s+(?:running|on|up))\b",
                no_params,
            ),
            IntentRule::new(
                "system_stats",
                G::Introspection,
                K::SystemStats,
                r"(?i)\b(?:system\s+(?:stats|status|info|information|load)|cpu\s+(?:usage|load)|(?:ram|memory)\s+usage|resource\s+usage)\b",
                no_params,
            ),
            IntentRule::new(
                "internet_check",
                G::Introspection,
                K::InternetCheck,
                r"(?i)\b(?:am\s+i\s+(?:online|connected)|check\s+(?:the\s+|my\s+)?internet|internet\s+(?:connection|status|check)|(?:is\s+)?(?:the\s+)?internet\s+(?:working|up|down))\b",
                no_params,
            ),
            IntentRule::new(
                "date_time",
                G::Introspection,
                K::DateTime,
                r"(?i)\b(?:what\s+(?:is\s+)?(?:the\s+)?(?:current\s+)?(?:time|date|day)|what's\s+the\s+(?:time|date|day)|what\s+time\s+is\s+it|what\s+day\s+is\s+(?:it|today)|today's\s+date|current\s+(?:time|date)|tell\s+me\s+the\s+(?:time|date))\b",
                extract_date_time,
            ),
            // =================================================================
            // Sensitive system operations
            // =================================================================
            IntentRule::new(
                "empty_recycle_bin",
                G::SensitiveSystem,
                K::EmptyRecycleBin,
                r"(?i)\b(?:empty|clear)\s+(?:the\s+|my\s+)?(?:recycle\s+bin|recycling\s+bin|trash(?:\s+can)?|bin)\b",
                no_params,
            ),
            IntentRule::new(
                "lock_screen",
                G::SensitiveSystem,
                K::LockScreen,
                r"(?i)\block\s+(?:the\s+|my\s+)?(?:screen|computer|pc|system|workstation)\b|\bsecure\s+(?:the\s+)?screen\b",
                no_params,
            ),
            IntentRule::new(
                "power",
                G::SensitiveSystem,
                K::Power,
                r"(?i)^(?:please\s+)?(?P<verb>shut\s*down|power\s+off|restart|reboot|log\s*off|log\s*out|sign\s*out)(?:\s+(?:the|my))?(?:\s+(?:computer|pc|system|machine|session|now))*\s*[.!]?$",
                extract_power,
            ),
            // =================================================================
            // Filesystem
            // =================================================================
            IntentRule::new(
                "list_directory",
                G::Filesystem,
                K::ListDirectory,
                r"(?i)\b(?:list\s+(?:the\s+)?files|show\s+(?:me\s+)?(?:the\s+)?files|list\s+(?:the\s+)?directory|directory\s+contents|ls|dir)\b(?:\s+(?:in|of|for|at|inside))?\s*(?P<path>.*)$",
                extract_path_or_current,
            ),
            IntentRule::new(
                "create_directory",
                G::Filesystem,
                K::CreateDirectory,
                r"(?i)\b(?:(?:create|make)\s+(?:a\s+)?(?:new\s+)?(?:directory|folder)|mkdir|new\s+folder)\s+(?:called\s+|named\s+|at\s+)?(?P<path>.+)$",
                extract_path,
            ),
            IntentRule::new(
                "open_file",
                G::Filesystem,
                K::OpenFile,
                r"(?i)\b(?:open|show|edit|view|launch)\s+(?:the\s+)?file\s+(?P<path>.+)$",
                extract_path,
            ),
            // =================================================================
            // Notes
            // =================================================================
            IntentRule::new(
                "take_note",
                G::Notes,
                K::TakeNote,
                r"(?i)\b(?:take\s+a\s+note|make\s+a\s+note|note\s+down|jot\s+down|remember\s+this|add\s+(?:a\s+)?note|note\s+that|remember\s+that)\b(?:\s+that\b)?\s*[:,-]?\s*(?P<note>.+)$",
                extract_note,
            ),
            IntentRule::new(
                "view_notes",
                G::Notes,
                K::ViewNotes,
                r"(?i)\b(?:(?:show|view|list|read)\s+(?:me\s+)?(?:my\s+|the\s+|all\s+)?notes|what\s+are\s+my\s+notes)\b",
                no_params,
            ),
            IntentRule::new(
                "clear_notes",
                G::Notes,
                K::ClearNotes,
                r"(?i)\b(?:clear|delete|erase|remove|forget)\s+(?:all\s+)?(?:of\s+)?(?:my\s+|the\s+)?notes\b",
                no_params,
            ),
            // =================================================================
            // Clipboard
            // =================================================================
            IntentRule::new(
                "read_clipboard",
                G::Clipboard,
                K::ReadClipboard,
                r"(?i)\b(?:paste\s+from\s+(?:the\s+)?clipboard|what(?:'s|\s+is)\s+(?:on|in)\s+(?:the\s+|my\s+)?clipboard|(?:get|show|read|check)\s+(?:the\s+|my\s+)?clipboard)\b",
                no_params,
            ),
            IntentRule::new(
                "copy_to_clipboard",
                G::Clipboard,
                K::CopyToClipboard,
                r"(?i)\bcopy(?:\s+(?:this|that))?(?:\s+to\s+(?:the\s+)?clipboard)?\s*[:\s]\s*(?P<text>.+)$",
                extract_clipboard_text,
            ),
            // =================================================================
            // Typed text injection
            // =================================================================
            IntentRule::new(
                "type_text",
                G::TypeText,
                K::TypeText,
                r"(?i)^(?:please\s+)?(?:type\s+(?:this|out)|enter\s+text|type)\s*[:\s]\s*(?P<text>.+)$",
                extract_typed_text,
            ),
            // =================================================================
            // URL open
            // =================================================================
            IntentRule::new(
                "open_url",
                G::UrlOpen,
                K::OpenUrl,
                r"(?i)\b(?:open|launch|go\s+to|visit|show\s+me|browse\s+to|navigate\s+to)\s+(?:the\s+)?(?:website\s+|site\s+|url\s+|page\s+)?(?P<url>(?:https?://)?[\w-]+(?:\.[\w-]+)+(?:[/?#:]\S*)?)\s*$",
                extract_url,
            ),
            // =================================================================
            // Web search
            // =================================================================
            IntentRule::new(
                "web_search",
                G::WebSearch,
                K::WebSearch,
                r"(?i)\b(?:search\s+(?:the\s+web\s+|google\s+|online\s+)?for|search|find|google|look\s+up|what\s+is|what's|who\s+is|who's|tell\s+me\s+about)\s+(?:for\s+)?(?P<query>.+?)\s*\??$",
                extract_search_query,
            ),
            // =================================================================
            // Applications
            // =================================================================
            IntentRule::new(
                "open_application",
                G::Applications,
                K::OpenApplication,
                r"(?i)\b(?:open|launch|start)\s+(?:up\s+)?(?:the\s+)?(?:app(?:lication)?\s+|program\s+)?(?P<name>\w[\w\s.+&'-]*?)(?:\s+(?:app|application|program))?\s*[.!]?$",
                extract_application,
            ),
            IntentRule::new(
                "close_application",
                G::Applications,
                K::CloseApplication,
                r"(?i)\b(?:close|quit|exit|terminate|kill)\s+(?:the\s+)?(?:app(?:lication)?\s+|program\s+)?(?P<name>\w[\w\s.+&'-]*?)(?:\s+(?:app|application|program))?\s*[.!]?$",
                extract_application,
            ),
            // =================================================================
            // Media transport
            // =================================================================
            IntentRule::new(
                "media_play_pause",
                G::Media,
                K::Media,
                r"(?i)\b(?:play|pause|resume|unpause)\b",
                extract_media_play_pause,
            ),
            IntentRule::new(
                "media_next",
                G::Media,
                K::Media,
                r"(?i)\b(?:next|skip)\b",
                extract_media_next,
            ),
            IntentRule::new(
                "media_previous",
                G::Media,
                K::Media,
                r"(?i)\b(?:previous|prev|go\s+back|last)\b",
                extract_media_previous,
            ),
            IntentRule::new(
                "media_stop",
                G::Media,
                K::Media,
                r"(?i)\bstop\b",
                extract_media_stop,
            ),
            // =================================================================
            // Volume
            // =================================================================
            IntentRule::new(
                "volume_set",
                G::Volume,
                K::Volume,
                r"(?i)\b(?:volume|sound)\s+(?:to\s+|at\s+|level\s+(?:to\s+)?)?(?P<level>\d{1,3})\s*(?:%|percent)?",
                extract_volume_level,
            ),
            IntentRule::new(
                "volume_up",
                G::Volume,
                K::Volume,
                r"(?i)\b(?:volume\s+up|turn\s+(?:it|the\s+volume|the\s+sound)\s+up|turn\s+up\s+(?:the\s+)?(?:volume|sound)|(?:increase|raise)\s+(?:the\s+)?(?:volume|sound)|louder)\b",
                |_, _| Some(vec![("command", "up".to_string())]),
            ),
            IntentRule::new(
                "volume_down",
                G::Volume,
                K::Volume,
                r"(?i)\b(?:volume\s+down|turn\s+(?:it|the\s+volume|the\s+sound)\s+down|turn\s+down\s+(?:the\s+)?(?:volume|sound)|(?:decrease|lower|reduce)\s+(?:the\s+)?(?:volume|sound)|quieter|softer)\b",
                |_, _| Some(vec![("command", "down".to_string())]),
            ),
            IntentRule::new(
                "volume_mute",
                G::Volume,
                K::Volume,
                r"(?i)^(?:please\s+)?(?:mute|unmute|toggle\s+mute)(?:\s+(?:the\s+)?(?:volume|sound|audio|speakers?|computer))?\s*[.!]?$",
                |_, _| Some(vec![("command", "mute".to_string())]),
            ),
            // =================================================================
            // Window focus
            // =================================================================
            IntentRule::new(
                "focus_window",
                G::WindowFocus,
                K::FocusWindow,
                r"(?i)\b(?:focus\s+on|switch\s+to|bring\s+to\s+front|activate\s+window|focus)\s+(?:the\s+)?(?P<target>\w[\w\s.:'-]*?)(?:\s+window)?\s*[.!]?$",
                extract_focus_target,
            ),
            // =================================================================
            // Tab close
            // =================================================================
            IntentRule::new(
                "close_tab",
                G::TabClose,
                K::CloseTab,
                r"(?i)\bclose\s+(?:the\s+|this\s+|that\s+)?(?:current\s+)?(?:browser\s+)?tab\b",
                no_params,
            ),
            // =================================================================
            // Help
            // =================================================================
            IntentRule::new(
                "help",
                G::Help,
                K::Help,
                r"(?i)^(?:help|help\s+me|commands|list\s+commands|show\s+commands|what\s+can\s+you\s+do|what\s+are\s+your\s+commands)\s*[?.!]?$",
                no_params,
            ),
        ];

        Self { rules }
    }

    /// Return the intent of the first rule that claims `text`.
    pub fn detect(&self, text: &str, context: &MatchContext) -> Option<Intent> {
        let lower = text.to_lowercase();
        let input = RuleInput {
            text,
            lower: &lower,
            context,
        };
        for rule in &self.rules {
            if let Some(intent) = rule.apply(&input) {
                tracing::debug!(rule = rule.name, kind = %intent.kind, "Intent matched");
                return Some(intent);
            }
        }
        None
    }

    /// Names of every rule that would claim `text`, in table order.
    ///
    /// Used to detect overlapping rules; [`detect`](Self::detect) only ever
    /// honours the first.
    pub fn claimants(&self, text: &str, context: &MatchContext) -> Vec<&'static str> {
        let lower = text.to_lowercase();
        let input = RuleInput {
            text,
            lower: &lower,
            context,
        };
        self.rules
            .iter()
            .filter(|rule| rule.apply(&input).is_some())
            .map(|rule| rule.name)
            .collect()
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }
}

// =============================================================================
// Extractors
// =============================================================================

fn no_params(_: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    Some(Vec::new())
}

fn capture<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn strip_quotes(text: &str) -> &str {
    text.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
}

fn extract_set_timer(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let spec = capture(caps, "spec")?;
    let (duration, description) = match TIMER_DESCRIPTION_SPLIT.find(spec) {
        Some(m) => (spec[..m.start()].trim(), Some(strip_quotes(&spec[m.end()..]))),
        None => (spec, None),
    };
    let mut params = vec![("duration", duration.to_string())];
    if let Some(desc) = description.filter(|d| !d.is_empty()) {
        params.push(("description", desc.to_string()));
    }
    Some(params)
}

fn extract_cancel_timer(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let raw = capture(caps, "after").or_else(|| capture(caps, "before"));
    let target = raw.map(|t| {
        let mut t = t.trim_start_matches('#');
        for prefix in ["for ", "called ", "named ", "number ", "id ", "no. "] {
            if let Some(rest) = t.strip_prefix(prefix) {
                t = rest;
            }
        }
        strip_quotes(t).trim_end_matches(['.', '!']).to_string()
    });
    Some(match target.filter(|t| !t.is_empty()) {
        Some(t) => vec![("target", t)],
        None => Vec::new(),
    })
}

fn extract_calculation(caps: &Captures<'_>, input: &RuleInput<'_>) -> Option<Params> {
    if ARITHMETIC_EXCLUSIONS.is_match(input.lower) {
        return None;
    }
    let expression = prepare_expression(capture(caps, "expr")?)?;
    Some(vec![("expression", expression)])
}

fn extract_weather(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let location = capture(caps, "location")?;
    Some(vec![("location", location.to_string())])
}

fn extract_random_range(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    Some(vec![
        ("min", capture(caps, "min")?.to_string()),
        ("max", capture(caps, "max")?.to_string()),
    ])
}

fn extract_date_time(_: &Captures<'_>, input: &RuleInput<'_>) -> Option<Params> {
    let wants_date = input.lower.contains("date") || input.lower.contains("day");
    let wants_time = input.lower.contains("time");
    let field = match (wants_date, wants_time) {
        (true, true) => "both",
        (true, false) => "date",
        _ => "time",
    };
    Some(vec![("field", field.to_string())])
}

fn extract_power(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let action = PowerAction::from_verb(capture(caps, "verb")?)?;
    Some(vec![("action", action.to_string())])
}

fn extract_path(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let path = strip_quotes(capture(caps, "path")?);
    if path.is_empty() {
        return None;
    }
    Some(vec![("path", path.to_string())])
}

fn extract_path_or_current(caps: &Captures<'_>, input: &RuleInput<'_>) -> Option<Params> {
    Some(extract_path(caps, input).unwrap_or_else(|| vec![("path", ".".to_string())]))
}

fn extract_note(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let note = strip_quotes(capture(caps, "note")?);
    if note.is_empty() {
        return None;
    }
    Some(vec![("note", note.to_string())])
}

fn extract_clipboard_text(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let text = strip_quotes(capture(caps, "text")?);
    if text.is_empty() {
        return None;
    }
    Some(vec![("text", text.to_string())])
}

fn extract_typed_text(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let text = capture(caps, "text")?;
    let text = match text.strip_prefix(':') {
        Some(rest) => rest.trim(),
        None => text,
    };
    if text.is_empty() {
        return None;
    }
    Some(vec![("text", strip_quotes(text).to_string())])
}

fn extract_url(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let raw = capture(caps, "url")?.trim_end_matches(['.', ',', '!']);
    let without_scheme = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
        .unwrap_or(raw);
    let host = without_scheme
        .split(['/', '?', '#', ':'])
        .next()
        .unwrap_or(without_scheme);
    let tld = host.rsplit('.').next().unwrap_or("").to_lowercase();
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if DOCUMENT_EXTENSIONS.contains(&tld.as_str()) {
        return None;
    }
    let url = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    Some(vec![("url", url)])
}

fn extract_search_query(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let query = capture(caps, "query")?;
    if query.chars().count() <= 2 {
        return None;
    }
    let lowered = query.to_lowercase();
    let first_meaningful = lowered
        .split_whitespace()
        .find(|w| !ARTICLES.contains(w))
        .unwrap_or("");
    let first_meaningful = first_meaningful.trim_matches(|c: char| !c.is_alphanumeric());
    if RESERVED_SEARCH_WORDS.contains(&first_meaningful) {
        return None;
    }
    Some(vec![("query", query.to_string())])
}

fn extract_application(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let name = capture(caps, "name")?;
    let lowered = name.to_lowercase();
    if lowered.chars().count() < 2 || PRONOUN_TARGETS.contains(&lowered.as_str()) {
        return None;
    }
    if lowered
        .split_whitespace()
        .any(|w| NON_APPLICATION_NOUNS.contains(&w))
    {
        return None;
    }
    Some(vec![("name", name.to_string())])
}

fn media_command(command: MediaCommand) -> Option<Params> {
    Some(vec![("command", command.to_string())])
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn extract_media_play_pause(_: &Captures<'_>, input: &RuleInput<'_>) -> Option<Params> {
    let bare = word_count(input.lower) <= 2 && input.context.media_context;
    if MEDIA_WORDS.is_match(input.lower) || bare {
        return media_command(MediaCommand::PlayPause);
    }
    None
}

fn extract_media_next(_: &Captures<'_>, input: &RuleInput<'_>) -> Option<Params> {
    let bare = word_count(input.lower) <= 3 && input.context.media_context;
    if MEDIA_WORDS.is_match(input.lower) || bare {
        return media_command(MediaCommand::Next);
    }
    None
}

fn extract_media_previous(_: &Captures<'_>, input: &RuleInput<'_>) -> Option<Params> {
    let bare = word_count(input.lower) <= 3 && input.context.media_context;
    if MEDIA_WORDS.is_match(input.lower) || bare {
        return media_command(MediaCommand::Previous);
    }
    None
}

fn extract_media_stop(_: &Captures<'_>, input: &RuleInput<'_>) -> Option<Params> {
    let bare = word_count(input.lower) <= 2 && input.context.media_context;
    if MEDIA_WORDS.is_match(input.lower) || bare {
        return media_command(MediaCommand::Stop);
    }
    None
}

fn extract_volume_level(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    Some(vec![
        ("command", "set".to_string()),
        ("level", capture(caps, "level")?.to_string()),
    ])
}

fn extract_focus_target(caps: &Captures<'_>, _: &RuleInput<'_>) -> Option<Params> {
    let target = capture(caps, "target")?;
    if PRONOUN_TARGETS.contains(&target.to_lowercase().as_str()) {
        return None;
    }
    Some(vec![("target", target.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Option<Intent> {
        PatternSet::new().detect(text, &MatchContext::default())
    }

    fn kind(text: &str) -> Option<IntentKind> {
        detect(text).map(|i| i.kind)
    }

    fn media() -> MatchContext {
        MatchContext {
            media_context: true,
        }
    }

    // =========================================================================
    // Table structure
    // =========================================================================

    #[test]
    fn test_rules_sorted_by_precedence_group() {
        let set = PatternSet::new();
        let groups: Vec<PrecedenceGroup> = set.rules().iter().map(|r| r.group).collect();
        let mut sorted = groups.clone();
        sorted.sort();
        assert_eq!(groups, sorted);
    }

    #[test]
    fn test_rule_names_unique() {
        let set = PatternSet::new();
        let mut names: Vec<&str> = set.rules().iter().map(|r| r.name).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_canned_inputs_claimed_by_exactly_one_rule() {
        let set = PatternSet::new();
        let ctx = MatchContext::default();
        let cases = [
            ("open gui", "launch_interface"),
            ("cancel all timers", "cancel_all_timers"),
            ("set a timer for 10 minutes called tea", "set_timer"),
            ("cancel timer 2", "cancel_timer"),
            ("calculate 2 + 2", "calculate"),
            ("weather in Paris", "weather"),
            ("roll a die", "roll_dice"),
            ("flip a coin", "flip_coin"),
            ("tell me a joke", "tell_joke"),
            ("random number between 1 and 10", "random_number"),
            ("system uptime", "system_uptime"),
            ("cpu usage", "system_stats"),
            ("am i online", "internet_check"),
            ("what time is it", "date_time"),
            ("empty the recycle bin", "empty_recycle_bin"),
            ("lock the screen", "lock_screen"),
            ("restart", "power"),
            ("list files in ~/Downloads", "list_directory"),
            ("create folder projects", "create_directory"),
            ("open file report.pdf", "open_file"),
            ("take a note buy milk", "take_note"),
            ("show my notes", "view_notes"),
            ("clear my notes", "clear_notes"),
            ("read clipboard", "read_clipboard"),
            ("copy to clipboard: hello there", "copy_to_clipboard"),
            ("type: Hello World", "type_text"),
            ("go to example.com", "open_url"),
            ("search for rust borrow checker", "web_search"),
            ("launch firefox", "open_application"),
            ("quit spotify", "close_application"),
            ("pause the music", "media_play_pause"),
            ("skip this song", "media_next"),
            ("previous track", "media_previous"),
            ("set volume to 40%", "volume_set"),
            ("turn up the volume", "volume_up"),
            ("quieter", "volume_down"),
            ("mute", "volume_mute"),
            ("switch to terminal", "focus_window"),
            ("close this tab", "close_tab"),
            ("help", "help"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                set.claimants(input, &ctx),
                vec![expected],
                "input {:?} should be claimed only by {}",
                input,
                expected
            );
        }
    }

    #[test]
    fn test_media_stop_claimed_only_with_media_context() {
        let set = PatternSet::new();
        assert!(set.claimants("stop", &MatchContext::default()).is_empty());
        assert_eq!(set.claimants("stop", &media()), vec!["media_stop"]);
    }

    // =========================================================================
    // Precedence
    // =========================================================================

    #[test]
    fn test_calculate_routes_to_arithmetic_not_search() {
        let intent = detect("calculate 2 + 2").unwrap();
        assert_eq!(intent.kind, IntentKind::Calculate);
        assert_eq!(intent.param("expression"), Some("2 + 2"));
    }

    #[test]
    fn test_what_is_the_time_routes_to_date_time() {
        let intent = detect("what is the time").unwrap();
        assert_eq!(intent.kind, IntentKind::DateTime);
        assert_eq!(intent.param("field"), Some("time"));
    }

    #[test]
    fn test_what_is_with_numbers_routes_to_arithmetic() {
        let intent = detect("what is 12 times 3?").unwrap();
        assert_eq!(intent.kind, IntentKind::Calculate);
        assert_eq!(intent.param("expression"), Some("12 * 3"));
    }

    #[test]
    fn test_what_is_without_numbers_routes_to_search() {
        let intent = detect("what is a black hole").unwrap();
        assert_eq!(intent.kind, IntentKind::WebSearch);
        assert_eq!(intent.param("query"), Some("a black hole"));
    }

    #[test]
    fn test_arithmetic_excludes_note_keyword() {
        // Contains a digit and "what is", but names a note.
        assert_ne!(kind("what is note 3"), Some(IntentKind::Calculate));
    }

    #[test]
    fn test_open_file_before_url_and_app() {
        assert_eq!(kind("open file notes.txt"), Some(IntentKind::OpenFile));
    }

    #[test]
    fn test_url_beats_application() {
        let intent = detect("open github.com").unwrap();
        assert_eq!(intent.kind, IntentKind::OpenUrl);
        assert_eq!(intent.param("url"), Some("https://github.com"));
    }

    #[test]
    fn test_timer_start_beats_application_start() {
        assert_eq!(kind("start a timer for 5 minutes"), Some(IntentKind::SetTimer));
    }

    // =========================================================================
    // Timers
    // =========================================================================

    #[test]
    fn test_set_timer_with_description() {
        let intent = detect("set a timer for 10 minutes called tea").unwrap();
        assert_eq!(intent.param("duration"), Some("10 minutes"));
        assert_eq!(intent.param("description"), Some("tea"));
    }

    #[test]
    fn test_set_timer_description_introduced_by_for() {
        let intent = detect("set a timer for 1h 30m for the roast").unwrap();
        assert_eq!(intent.param("duration"), Some("1h 30m"));
        assert_eq!(intent.param("description"), Some("the roast"));
    }

    #[test]
    fn test_set_timer_short_form() {
        let intent = detect("timer 90").unwrap();
        assert_eq!(intent.kind, IntentKind::SetTimer);
        assert_eq!(intent.param("duration"), Some("90"));
        assert_eq!(intent.param("description"), None);
    }

    #[test]
    fn test_cancel_timer_variants() {
        let intent = detect("cancel timer 3").unwrap();
        assert_eq!(intent.kind, IntentKind::CancelTimer);
        assert_eq!(intent.param("target"), Some("3"));

        let intent = detect("stop the tea timer").unwrap();
        assert_eq!(intent.param("target"), Some("tea"));

        let intent = detect("cancel timer for pasta").unwrap();
        assert_eq!(intent.param("target"), Some("pasta"));

        let intent = detect("cancel the timer").unwrap();
        assert_eq!(intent.kind, IntentKind::CancelTimer);
        assert_eq!(intent.param("target"), None);
    }

    #[test]
    fn test_cancel_all_timers_variants() {
        assert_eq!(kind("stop all the timers"), Some(IntentKind::CancelAllTimers));
        assert_eq!(kind("clear my timers"), Some(IntentKind::CancelAllTimers));
    }

    // =========================================================================
    // Sensitive
    // =========================================================================

    #[test]
    fn test_power_verbs() {
        let cases = [
            ("shutdown", "shutdown"),
            ("shut down the computer", "shutdown"),
            ("reboot now", "restart"),
            ("please log off", "logout"),
            ("sign out", "logout"),
        ];
        for (input, action) in cases {
            let intent = detect(input).unwrap();
            assert_eq!(intent.kind, IntentKind::Power, "{}", input);
            assert_eq!(intent.param("action"), Some(action), "{}", input);
        }
    }

    #[test]
    fn test_power_word_inside_sentence_is_not_power() {
        assert_ne!(kind("restart spotify"), Some(IntentKind::Power));
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    #[test]
    fn test_note_preserves_case() {
        let intent = detect("Note that Bob's Birthday is Friday").unwrap();
        assert_eq!(intent.kind, IntentKind::TakeNote);
        assert_eq!(intent.param("note"), Some("Bob's Birthday is Friday"));
    }

    #[test]
    fn test_type_text_preserves_case() {
        let intent = detect("type this: Dear Sir").unwrap();
        assert_eq!(intent.kind, IntentKind::TypeText);
        assert_eq!(intent.param("text"), Some("Dear Sir"));
    }

    #[test]
    fn test_list_directory_defaults_to_current() {
        let intent = detect("list files").unwrap();
        assert_eq!(intent.param("path"), Some("."));
    }

    #[test]
    fn test_weather_location() {
        let intent = detect("what's the weather like in New York?").unwrap();
        assert_eq!(intent.kind, IntentKind::Weather);
        assert_eq!(intent.param("location"), Some("New York"));
    }

    #[test]
    fn test_random_range_params() {
        let intent = detect("pick a number from 5 to 50").unwrap();
        assert_eq!(intent.param("min"), Some("5"));
        assert_eq!(intent.param("max"), Some("50"));
    }

    #[test]
    fn test_date_time_fields() {
        assert_eq!(detect("what is the date").unwrap().param("field"), Some("date"));
        assert_eq!(detect("what day is it").unwrap().param("field"), Some("date"));
        assert_eq!(
            detect("tell me the current date and time").unwrap().param("field"),
            Some("both")
        );
    }

    // =========================================================================
    // Rejections
    // =========================================================================

    #[test]
    fn test_url_rejects_document_extensions() {
        let set = PatternSet::new();
        let claimed = set.claimants("open report.pdf", &MatchContext::default());
        assert!(!claimed.contains(&"open_url"));
    }

    #[test]
    fn test_url_rejects_version_numbers() {
        let set = PatternSet::new();
        let claimed = set.claimants("open python3.11", &MatchContext::default());
        assert!(!claimed.contains(&"open_url"));
    }

    #[test]
    fn test_search_rejects_reserved_first_word() {
        let set = PatternSet::new();
        let ctx = MatchContext::default();
        assert!(!set.claimants("search timer settings", &ctx).contains(&"web_search"));
        assert!(!set.claimants("what is the weather", &ctx).contains(&"web_search"));
        assert!(!set.claimants("find me", &ctx).contains(&"web_search"));
    }

    #[test]
    fn test_application_rejects_non_application_nouns() {
        let set = PatternSet::new();
        let ctx = MatchContext::default();
        assert!(!set.claimants("open a new tab", &ctx).contains(&"open_application"));
        assert!(!set.claimants("close the window", &ctx).contains(&"close_application"));
        assert!(!set.claimants("close this tab", &ctx).contains(&"close_application"));
        assert!(!set.claimants("open it", &ctx).contains(&"open_application"));
    }

    #[test]
    fn test_focus_rejects_pronouns() {
        assert_eq!(kind("focus on me"), None);
    }

    // =========================================================================
    // Media context
    // =========================================================================

    #[test]
    fn test_bare_play_needs_media_context() {
        let set = PatternSet::new();
        assert_eq!(set.detect("pause", &MatchContext::default()), None);
        let intent = set.detect("pause", &media()).unwrap();
        assert_eq!(intent.kind, IntentKind::Media);
        assert_eq!(intent.param("command"), Some("play_pause"));
    }

    #[test]
    fn test_next_with_media_keyword() {
        let intent = detect("next song please").unwrap();
        assert_eq!(intent.param("command"), Some("next"));
    }

    #[test]
    fn test_play_without_media_is_not_media() {
        assert_eq!(kind("let's play a game of chess"), None);
    }

    #[test]
    fn test_volume_set_level() {
        let intent = detect("set the volume to 75 percent").unwrap();
        assert_eq!(intent.kind, IntentKind::Volume);
        assert_eq!(intent.param("command"), Some("set"));
        assert_eq!(intent.param("level"), Some("75"));
    }

    #[test]
    fn test_unmatched_chit_chat() {
        assert_eq!(kind("how are you today"), None);
        assert_eq!(kind("good morning"), None);
    }
}
