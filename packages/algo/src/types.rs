//! Common Types and Constants
//!
//! Shared data structures used across all assessment modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Default IRT discrimination for uncalibrated items
pub const DEFAULT_DISCRIMINATION: f64 = 1.0;

/// Default IRT difficulty for uncalibrated items
pub const DEFAULT_DIFFICULTY: f64 = 0.0;

/// Default IRT guessing floor for uncalibrated items (four-option MCQ)
pub const DEFAULT_GUESSING: f64 = 0.25;

/// Accuracy assumed for a skill with no recorded history
pub const DEFAULT_ACCURACY: f64 = 0.5;

/// Seconds-per-item speed assumed for a skill with no recorded history
pub const DEFAULT_SPEED_S: f64 = 60.0;

// ==================== Sections ====================

/// Digital SAT section
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    ReadingAndWriting,
    Math,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::ReadingAndWriting => "ReadingAndWriting",
            Section::Math => "Math",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ReadingAndWriting" => Some(Section::ReadingAndWriting),
            "Math" => Some(Section::Math),
            _ => None,
        }
    }

    /// Operational item count per adaptive module
    pub fn module_item_count(&self) -> usize {
        match self {
            Section::ReadingAndWriting => 27,
            Section::Math => 22,
        }
    }
}

// ==================== Difficulty Bands ====================

/// Five-level item difficulty band, ordered lowest to highest
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DifficultyBand {
    D1,
    D2,
    D3,
    D4,
    D5,
}

impl DifficultyBand {
    /// All bands in ascending order
    pub const ALL: [DifficultyBand; 5] = [
        DifficultyBand::D1,
        DifficultyBand::D2,
        DifficultyBand::D3,
        DifficultyBand::D4,
        DifficultyBand::D5,
    ];

    /// Default IRT difficulty `b` assigned to items in this band
    pub fn irt_b(&self) -> f64 {
        match self {
            DifficultyBand::D1 => -1.5,
            DifficultyBand::D2 => -0.5,
            DifficultyBand::D3 => 0.5,
            DifficultyBand::D4 => 1.5,
            DifficultyBand::D5 => 2.5,
        }
    }

    /// One band up, saturating at D5
    pub fn harder(&self) -> Self {
        match self {
            DifficultyBand::D1 => DifficultyBand::D2,
            DifficultyBand::D2 => DifficultyBand::D3,
            DifficultyBand::D3 => DifficultyBand::D4,
            _ => DifficultyBand::D5,
        }
    }

    /// One band down, saturating at D1
    pub fn easier(&self) -> Self {
        match self {
            DifficultyBand::D5 => DifficultyBand::D4,
            DifficultyBand::D4 => DifficultyBand::D3,
            DifficultyBand::D3 => DifficultyBand::D2,
            _ => DifficultyBand::D1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyBand::D1 => "D1",
            DifficultyBand::D2 => "D2",
            DifficultyBand::D3 => "D3",
            DifficultyBand::D4 => "D4",
            DifficultyBand::D5 => "D5",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "D1" => Some(DifficultyBand::D1),
            "D2" => Some(DifficultyBand::D2),
            "D3" => Some(DifficultyBand::D3),
            "D4" => Some(DifficultyBand::D4),
            "D5" => Some(DifficultyBand::D5),
            _ => None,
        }
    }

    /// Zero-based position in [`DifficultyBand::ALL`]
    pub fn to_index(&self) -> usize {
        match self {
            DifficultyBand::D1 => 0,
            DifficultyBand::D2 => 1,
            DifficultyBand::D3 => 2,
            DifficultyBand::D4 => 3,
            DifficultyBand::D5 => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        DifficultyBand::ALL.get(index).copied()
    }

    /// One-based band number (D1 → 1 … D5 → 5), used when averaging bands
    pub fn band_number(&self) -> u8 {
        self.to_index() as u8 + 1
    }
}

// ==================== IRT Parameters ====================

/// Answer format of an item, which fixes the guessing floor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionFormat {
    /// Four-option multiple choice
    #[serde(rename = "MCQ")]
    MultipleChoice,
    /// Student-produced response (grid-in)
    #[serde(rename = "SPR")]
    StudentProducedResponse,
}

impl QuestionFormat {
    /// Guessing parameter `c` implied by the format
    pub fn guessing_floor(&self) -> f64 {
        match self {
            QuestionFormat::MultipleChoice => 0.25,
            QuestionFormat::StudentProducedResponse => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionFormat::MultipleChoice => "MCQ",
            QuestionFormat::StudentProducedResponse => "SPR",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MCQ" => Some(QuestionFormat::MultipleChoice),
            "SPR" => Some(QuestionFormat::StudentProducedResponse),
            _ => None,
        }
    }
}

/// Per-item IRT triple (discrimination, difficulty, guessing)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemParams {
    /// Discrimination `a`, > 0
    pub a: f64,
    /// Difficulty `b` on the theta scale
    pub b: f64,
    /// Guessing floor `c` in [0, 1)
    pub c: f64,
}

impl Default for ItemParams {
    fn default() -> Self {
        Self {
            a: DEFAULT_DISCRIMINATION,
            b: DEFAULT_DIFFICULTY,
            c: DEFAULT_GUESSING,
        }
    }
}

impl ItemParams {
    /// Derive the triple from an item's band and answer format
    pub fn for_band(band: DifficultyBand, format: QuestionFormat) -> Self {
        Self {
            a: DEFAULT_DISCRIMINATION,
            b: band.irt_b(),
            c: format.guessing_floor(),
        }
    }
}

// ==================== Responses and Outcomes ====================

/// One scored answer within a module
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModuleResponse {
    /// Whether the answer matched the key
    pub correct: bool,
    /// Seconds spent on the item
    pub time_spent_s: f64,
}

/// Classified outcome of a single response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeTag {
    CorrectFast,
    CorrectSlow,
    WrongTrap,
    WrongKnowledge,
    WrongProcess,
    Skipped,
    Guessed,
    Timeout,
}

impl OutcomeTag {
    pub fn is_correct(&self) -> bool {
        matches!(self, OutcomeTag::CorrectFast | OutcomeTag::CorrectSlow)
    }

    pub fn is_fast(&self) -> bool {
        matches!(self, OutcomeTag::CorrectFast)
    }

    /// Wrong answer with a diagnosable cause (excludes skips and timeouts)
    pub fn is_wrong(&self) -> bool {
        matches!(
            self,
            OutcomeTag::WrongTrap | OutcomeTag::WrongKnowledge | OutcomeTag::WrongProcess
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeTag::CorrectFast => "CORRECT_FAST",
            OutcomeTag::CorrectSlow => "CORRECT_SLOW",
            OutcomeTag::WrongTrap => "WRONG_TRAP",
            OutcomeTag::WrongKnowledge => "WRONG_KNOWLEDGE",
            OutcomeTag::WrongProcess => "WRONG_PROCESS",
            OutcomeTag::Skipped => "SKIPPED",
            OutcomeTag::Guessed => "GUESSED",
            OutcomeTag::Timeout => "TIMEOUT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CORRECT_FAST" => Some(OutcomeTag::CorrectFast),
            "CORRECT_SLOW" => Some(OutcomeTag::CorrectSlow),
            "WRONG_TRAP" => Some(OutcomeTag::WrongTrap),
            "WRONG_KNOWLEDGE" => Some(OutcomeTag::WrongKnowledge),
            "WRONG_PROCESS" => Some(OutcomeTag::WrongProcess),
            "SKIPPED" => Some(OutcomeTag::Skipped),
            "GUESSED" => Some(OutcomeTag::Guessed),
            "TIMEOUT" => Some(OutcomeTag::Timeout),
            _ => None,
        }
    }
}

/// Diagnosed root cause attached to a wrong answer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorRootCause {
    EKnowledge,
    ETranslation,
    EConstraint,
    ELogic,
    EProcess,
    ECalc,
    ERead,
    ETime,
}

impl ErrorRootCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorRootCause::EKnowledge => "E_KNOWLEDGE",
            ErrorRootCause::ETranslation => "E_TRANSLATION",
            ErrorRootCause::EConstraint => "E_CONSTRAINT",
            ErrorRootCause::ELogic => "E_LOGIC",
            ErrorRootCause::EProcess => "E_PROCESS",
            ErrorRootCause::ECalc => "E_CALC",
            ErrorRootCause::ERead => "E_READ",
            ErrorRootCause::ETime => "E_TIME",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "E_KNOWLEDGE" => Some(ErrorRootCause::EKnowledge),
            "E_TRANSLATION" => Some(ErrorRootCause::ETranslation),
            "E_CONSTRAINT" => Some(ErrorRootCause::EConstraint),
            "E_LOGIC" => Some(ErrorRootCause::ELogic),
            "E_PROCESS" => Some(ErrorRootCause::EProcess),
            "E_CALC" => Some(ErrorRootCause::ECalc),
            "E_READ" => Some(ErrorRootCause::ERead),
            "E_TIME" => Some(ErrorRootCause::ETime),
            _ => None,
        }
    }
}

// ==================== Skill Tracking ====================

/// Per (user, skill) tracking state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillState {
    /// EWMA accuracy in [0, 1]
    pub accuracy: f64,
    /// EWMA seconds per item
    pub speed: f64,
    /// Band the user is currently assigned for this skill
    pub difficulty_band: DifficultyBand,
    /// When the state was last folded
    pub last_updated: DateTime<Utc>,
}

/// The slice of a logged error event the weakness score consumes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub outcome: OutcomeTag,
    pub root_cause: Option<ErrorRootCause>,
}
