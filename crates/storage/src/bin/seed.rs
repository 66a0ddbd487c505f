use std::fmt;
use std::path::PathBuf;

use exam_core::model::{
    BankEntry, ContextBlock, ContextGroupDraft, QuestionBank, QuestionBody, QuestionDraft,
    QuestionId, SubQuestionDraft, flattened_len, select_subjects,
};
use storage::JsonQuestionBank;

#[derive(Debug, Clone)]
struct Args {
    out: PathBuf,
    subjects: Option<Vec<String>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidOut { raw: String },
    InvalidSubjects { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidOut { raw } => write!(f, "invalid --out value: {raw}"),
            ArgsError::InvalidSubjects { raw } => write!(f, "invalid --subjects value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_subjects(raw: &str) -> Result<Vec<String>, ArgsError> {
    let subjects: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if subjects.is_empty() {
        return Err(ArgsError::InvalidSubjects {
            raw: raw.to_string(),
        });
    }
    Ok(subjects)
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut out = std::env::var("EXAM_BANK_PATH")
            .map_or_else(|_| PathBuf::from("question_bank.json"), PathBuf::from);
        let mut subjects = match std::env::var("EXAM_SUBJECTS") {
            Ok(raw) => Some(parse_subjects(&raw)?),
            Err(_) => None,
        };

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out" => {
                    let value = require_value(&mut args, "--out")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidOut { raw: value });
                    }
                    out = PathBuf::from(value);
                }
                "--subjects" => {
                    let value = require_value(&mut args, "--subjects")?;
                    subjects = Some(parse_subjects(&value)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { out, subjects })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --out <path>              Output JSON file (default: question_bank.json)");
    eprintln!("  --subjects <a,b,...>      Only write entries for these subjects");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  EXAM_BANK_PATH, EXAM_SUBJECTS");
}

fn choice(id: u64, subject: &str, prompt: &str, options: &[&str], multi: bool) -> BankEntry {
    let options = options.iter().map(|o| (*o).to_string()).collect();
    BankEntry::Question(QuestionDraft {
        id: QuestionId::new(id),
        subject: subject.to_string(),
        prompt: prompt.to_string(),
        body: if multi {
            QuestionBody::MultiChoice { options }
        } else {
            QuestionBody::SingleChoice { options }
        },
    })
}

fn sample_entries() -> Vec<BankEntry> {
    vec![
        choice(
            1,
            "Math Literacy",
            "A store offers a 20% discount on a product originally priced at 5,000 tenge. What is the final price?",
            &["A) 3,000 tenge", "B) 3,500 tenge", "C) 4,000 tenge", "D) 4,500 tenge", "E) 5,000 tenge"],
            false,
        ),
        BankEntry::ContextGroup(ContextGroupDraft {
            subject: "Reading Literacy".to_string(),
            context: ContextBlock {
                text: "The Aral Sea, once the fourth-largest lake in the world, has shrunk dramatically since the 1960s due to Soviet-era irrigation projects that diverted its feeding rivers.".to_string(),
                image: None,
            },
            questions: vec![
                SubQuestionDraft {
                    id: QuestionId::new(2),
                    prompt: "Identify the main idea of the passage.".to_string(),
                    body: QuestionBody::SingleChoice {
                        options: vec![
                            "A) The Aral Sea is growing".to_string(),
                            "B) Irrigation caused the Aral Sea to shrink".to_string(),
                            "C) The Aral Sea is in Europe".to_string(),
                            "D) The Soviet Union built the Aral Sea".to_string(),
                            "E) The Aral Sea has always been small".to_string(),
                        ],
                    },
                },
                SubQuestionDraft {
                    id: QuestionId::new(3),
                    prompt: "Match each cause with its effect.".to_string(),
                    body: QuestionBody::Matching {
                        left_items: vec![
                            "Diverted rivers".to_string(),
                            "Exposed seabed".to_string(),
                        ],
                        right_options: vec![
                            "Less inflow".to_string(),
                            "Dust storms".to_string(),
                            "Higher rainfall".to_string(),
                        ],
                    },
                },
            ],
        }),
        choice(
            4,
            "Physics",
            "Which of the following are scalar quantities? Select all that apply.",
            &["A) Mass", "B) Velocity", "C) Temperature", "D) Force", "E) Energy", "F) Acceleration"],
            true,
        ),
    ]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let mut entries = sample_entries();
    if let Some(subjects) = &args.subjects {
        entries = select_subjects(&entries, subjects);
    }
    let bank = QuestionBank::new(entries)?;
    let items = flattened_len(bank.entries());

    JsonQuestionBank::new(&args.out).write(&bank).await?;

    println!(
        "Seeded {} bank entries ({} questions) into {}",
        bank.entries().len(),
        items,
        args.out.display()
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
