//! Tone selection and prompt assembly for the paraphrase endpoint.

use std::fmt;
use std::str::FromStr;

/// Rewriting style selector. The set is closed: any other value is a
/// validation error at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Humanize,
    Formal,
    Informal,
    Concise,
    Creative,
    Academic,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Humanize,
        Tone::Formal,
        Tone::Informal,
        Tone::Concise,
        Tone::Creative,
        Tone::Academic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Humanize => "humanize",
            Tone::Formal => "formal",
            Tone::Informal => "informal",
            Tone::Concise => "concise",
            Tone::Creative => "creative",
            Tone::Academic => "academic",
        }
    }

    /// The user-role instruction template for this tone.
    pub fn instruction(&self) -> &'static str {
        match self {
            Tone::Humanize => {
                "Humanize the following text in its entirety. \
                 The result must cover the COMPLETE text from start to finish, \
                 not just the beginning:"
            }
            Tone::Formal => {
                "Rewrite the following text in a formal, professional tone. \
                 Use proper grammar, avoid contractions, and maintain a polished \
                 style suitable for business or academic contexts."
            }
            Tone::Informal => {
                "Rewrite the following text in a casual, conversational tone. \
                 Use contractions, simple words, and make it feel like you're \
                 talking to a friend."
            }
            Tone::Concise => {
                "Rewrite the following text to be as concise as possible. \
                 Remove unnecessary words and filler while preserving the core \
                 meaning."
            }
            Tone::Creative => {
                "Rewrite the following text in a more creative and engaging way. \
                 Use vivid language, metaphors, or interesting phrasing while \
                 keeping the original meaning."
            }
            Tone::Academic => {
                "Rewrite the following text in an academic tone. Use scholarly \
                 language, precise terminology, and a structured approach \
                 suitable for research or essays."
            }
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "humanize" => Ok(Tone::Humanize),
            "formal" => Ok(Tone::Formal),
            "informal" => Ok(Tone::Informal),
            "concise" => Ok(Tone::Concise),
            "creative" => Ok(Tone::Creative),
            "academic" => Ok(Tone::Academic),
            _ => Err(()),
        }
    }
}

/// Style constraints shared by both humanize operating modes.
const HUMANIZE_STYLE_RULES: &str = "\
You are a humanizer. You are given a text and you need to humanize it.
You are not allowed to change the meaning of the text.
You are not allowed to add any new information to the text.
You are not allowed to remove any information from the text.
You are not allowed to change the structure of the text.
You are not allowed to change the formatting of the text.
Your job is to make the text more natural and human-like by changing words and phrases only.
FOLLOW THIS WRITING STYLE:
• SHOULD use clear, simple language.
• SHOULD be spartan and informative.
• SHOULD use short, impactful sentences.
• SHOULD use active voice; avoid passive voice.
• SHOULD focus on practical, actionable insights.
• SHOULD use \"you\" and \"your\" to directly address the reader.
• AVOID using em dashes (—) anywhere in your response. Use only commas, periods, or other standard punctuation.
• AVOID constructions like \"...not just this, but also this\".
• AVOID metaphors and clichés.
• AVOID generalizations.
• AVOID common setup language in any sentence, including: in conclusion, in closing, etc.
• AVOID output warnings or notes, just the output requested.
• AVOID unnecessary adjectives and adverbs.
• AVOID hashtags.
• AVOID semicolons.
• AVOID markdown.
• AVOID asterisks.
• AVOID these words: \"can, may, just, that, very, really, literally, actually, certainly, probably, basically, could, maybe, delve, embark, enlightening, esteemed, shed light, craft, crafting, imagine, realm, game-changer, unlock, discover, skyrocket, abyss, not alone, in a world where, revolutionize, disruptive, utilize, utilizing, dive deep, tapestry, illuminate, unveil, pivotal, intricate, elucidate, hence, furthermore, however, harness, exciting, groundbreaking, cutting-edge, remarkable, remains to be seen, glimpse into, navigating, landscape, stark, testament, in summary, moreover, boost, skyrocketing, opened up, powerful, inquiries, ever-evolving\"
# IMPORTANT: Review your response and ensure no em dashes!";

/// System instruction for humanize in options mode: the model must answer
/// with a flat JSON array of distinct variations.
pub fn humanize_options_system_prompt(word_count: usize, tolerance: u32) -> String {
    format!(
        "{HUMANIZE_STYLE_RULES}\n\
         THE RESULT SHOULD BE EXACTLY 5 DISTINCT OPTIONS AS A FLAT JSON ARRAY OF STRINGS \
         (NO OBJECTS, NO NUMBERING, NO EXPLANATIONS).\n\
         EACH OPTION SHOULD BE A DISTINCT VARIATION OF THE ORIGINAL TEXT.\n\
         EACH OPTION SHOULD BE NO MORE THAN {tolerance} WORDS MORE OR LESS THAN {word_count}, \
         THE NUMBER OF WORDS IN THE ORIGINAL TEXT."
    )
}

/// System instruction for humanize in rewrite mode: a single rewrite that
/// preserves the input's length and paragraph structure.
pub fn humanize_rewrite_system_prompt(
    word_count: usize,
    paragraph_count: usize,
    tolerance: u32,
) -> String {
    format!(
        "{HUMANIZE_STYLE_RULES}\n\
         THE RESULT SHOULD BE ONE REWRITE OF THE ORIGINAL TEXT, NOTHING ELSE.\n\
         THE RESULT SHOULD BE NO MORE THAN {tolerance} WORDS MORE OR LESS THAN {word_count}, \
         THE NUMBER OF WORDS IN THE ORIGINAL TEXT.\n\
         THE RESULT SHOULD KEEP THE ORIGINAL {paragraph_count} PARAGRAPH STRUCTURE."
    )
}

/// Assemble the user-role prompt for a request. The word target is
/// restated here as well: models drift toward summarizing long inputs,
/// and the explicit count pins the output length.
pub fn build_user_prompt(tone: Tone, text: &str, word_count: usize) -> String {
    match tone {
        Tone::Humanize => format!(
            "{}\n\nThe original text is {} words long. Keep your output at approximately {} words.\n\nText to rewrite:\n\n{}",
            tone.instruction(),
            word_count,
            word_count,
            text
        ),
        _ => format!("{}\n\nText to rewrite:\n\n{}", tone.instruction(), text),
    }
}

/// Number of whitespace-separated words in the input.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of non-empty paragraphs (blank-line separated blocks).
pub fn paragraph_count(text: &str) -> usize {
    text.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .count()
        .max(1)
}
