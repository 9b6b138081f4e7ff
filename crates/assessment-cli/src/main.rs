mod presenter;
mod telemetry;

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use assessment_spec::{
    Answer, AnswerStore, Answers, EditOp, EngineConfig, Question, QuestionId, QuestionKind,
    Schema, answers_schema, assemble_submission, document_json_schema, editor, validate_with,
    visible_set,
};
use clap::{Parser, Subcommand};
use presenter::{
    AnswerParseError, PreviewPresenter, PromptContext, Verbosity, describe_validation,
    print_visible_questions,
};
use serde_json::Number;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Assessment engine CLI",
    long_about = "Previews, validates and edits job assessments stored as JSON schema documents"
)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. "info", "assessment_spec=debug").
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer an assessment interactively, the way a candidate would.
    Preview {
        /// Path to the assessment schema JSON.
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Optional JSON file containing initial answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Engine configuration JSON.
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
        /// Candidate id stamped on the submission payload.
        #[arg(long, default_value = "preview")]
        candidate: String,
        /// Show visible questions, choices and the CBOR payload.
        #[arg(long, alias = "debug")]
        verbose: bool,
    },
    /// Print the visible questions and the answers that survive pruning.
    Visible {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
    /// Validate answers against an assessment schema.
    Validate {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        #[arg(long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the submission payload built from a set of answers.
    Submit {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        #[arg(long)]
        candidate: String,
    },
    /// Print the JSON Schema of the answers accepted for the visible questions.
    AnswersSchema {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// Answers deciding which conditional questions are visible.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
    },
    /// Print the JSON Schema of the assessment document itself.
    WireSchema,
    /// Report dangling and cyclic conditional dependencies.
    Check {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
    },
    /// Apply a JSON array of editor operations to a schema.
    Edit {
        #[arg(long, value_name = "SCHEMA")]
        schema: PathBuf,
        /// JSON file with the operations, e.g. [{"op": "add_section"}].
        #[arg(long, value_name = "OPS")]
        ops: PathBuf,
        /// Where to write the edited schema (defaults to stdout).
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.log_level)?;
    match cli.command {
        Command::Preview {
            schema,
            answers,
            config,
            candidate,
            verbose,
        } => run_preview(schema, answers, config, candidate, verbose),
        Command::Visible {
            schema,
            answers,
            config,
        } => run_visible(schema, answers, config),
        Command::Validate {
            schema,
            answers,
            config,
        } => run_validate(schema, answers, config),
        Command::Submit {
            schema,
            answers,
            candidate,
        } => run_submit(schema, answers, candidate),
        Command::AnswersSchema { schema, answers } => run_answers_schema(schema, answers),
        Command::WireSchema => run_wire_schema(),
        Command::Check { schema } => run_check(schema),
        Command::Edit { schema, ops, out } => run_edit(schema, ops, out),
    }
}

fn load_schema(path: &Path) -> CliResult<Schema> {
    let contents = fs::read_to_string(path)?;
    let schema: Schema = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid schema {}: {}", path.display(), err))?;
    tracing::debug!(
        job_id = schema.job_id(),
        questions = schema.len(),
        "loaded assessment"
    );
    Ok(schema)
}

fn load_answers(path: &Path) -> CliResult<Answers> {
    let contents = fs::read_to_string(path)?;
    let answers = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid answers {}: {}", path.display(), err))?;
    Ok(answers)
}

fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn run_visible(
    schema_path: PathBuf,
    answers_path: PathBuf,
    config: Option<PathBuf>,
) -> CliResult<()> {
    let schema = load_schema(&schema_path)?;
    let answers = load_answers(&answers_path)?;
    let config = load_config(config.as_deref())?;

    let store = AnswerStore::with_answers(&schema, answers, config.visibility);
    print_visible_questions(&schema, store.visible());
    println!("Answers:");
    println!("{}", store.to_json_pretty()?);
    Ok(())
}

fn run_validate(
    schema_path: PathBuf,
    answers_path: PathBuf,
    config: Option<PathBuf>,
) -> CliResult<()> {
    let schema = load_schema(&schema_path)?;
    let answers = load_answers(&answers_path)?;
    let config = load_config(config.as_deref())?;

    let store = AnswerStore::with_answers(&schema, answers, config.visibility);
    let result = validate_with(&schema, store.answers(), store.visible(), &config.validation);
    describe_validation(&result);

    if result.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn run_submit(schema_path: PathBuf, answers_path: PathBuf, candidate: String) -> CliResult<()> {
    let schema = load_schema(&schema_path)?;
    let answers = load_answers(&answers_path)?;
    let request = assemble_submission(&schema, &answers, candidate);
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

fn run_answers_schema(schema_path: PathBuf, answers_path: Option<PathBuf>) -> CliResult<()> {
    let schema = load_schema(&schema_path)?;
    let answers = match answers_path {
        Some(path) => load_answers(&path)?,
        None => Answers::new(),
    };
    let visible = visible_set(&schema, &answers);
    println!(
        "{}",
        serde_json::to_string_pretty(&answers_schema(&schema, &visible))?
    );
    Ok(())
}

fn run_wire_schema() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&document_json_schema())?);
    Ok(())
}

fn run_check(schema_path: PathBuf) -> CliResult<()> {
    let schema = load_schema(&schema_path)?;
    let graph = schema.dependency_graph();

    let dangling = graph.dangling();
    for (question, missing) in &dangling {
        let section = schema
            .section_of(question.as_str())
            .map(|section| section.title.as_str())
            .unwrap_or("<none>");
        println!(
            "Dangling dependency: {} (section '{}') depends on missing question '{}'",
            question, section, missing
        );
    }

    let cycles = graph.cycles();
    for cycle in &cycles {
        let ids: Vec<&str> = cycle.iter().map(QuestionId::as_str).collect();
        println!("Dependency cycle between: {}", ids.join(", "));
    }

    if dangling.is_empty() && cycles.is_empty() {
        println!("No dependency problems found.");
    }
    if cycles.is_empty() {
        Ok(())
    } else {
        Err(format!("{} dependency cycle(s) found", cycles.len()).into())
    }
}

fn run_edit(schema_path: PathBuf, ops_path: PathBuf, out: Option<PathBuf>) -> CliResult<()> {
    let mut schema = load_schema(&schema_path)?;
    let contents = fs::read_to_string(&ops_path)?;
    let ops: Vec<EditOp> = serde_json::from_str(&contents)
        .map_err(|err| format!("invalid operations {}: {}", ops_path.display(), err))?;

    for (index, op) in ops.iter().enumerate() {
        schema = editor::apply(&schema, op)
            .map_err(|err| format!("operation {} failed: {}", index + 1, err))?;
    }
    tracing::info!(
        job_id = schema.job_id(),
        applied = ops.len(),
        "applied editor operations"
    );

    let rendered = serde_json::to_string_pretty(&schema)?;
    match out {
        Some(path) => {
            fs::write(&path, format!("{}\n", rendered))?;
            println!("Wrote edited assessment to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn run_preview(
    schema_path: PathBuf,
    answers_path: Option<PathBuf>,
    config: Option<PathBuf>,
    candidate: String,
    verbose: bool,
) -> CliResult<()> {
    let schema = load_schema(&schema_path)?;
    let config = load_config(config.as_deref())?;
    let initial = match answers_path {
        Some(path) => load_answers(&path)?,
        None => Answers::new(),
    };

    let mut store = AnswerStore::with_answers(&schema, initial, config.visibility);
    let mut presenter = PreviewPresenter::new(Verbosity::from_verbose(verbose));
    let mut asked: BTreeSet<QuestionId> = store.answers().keys().cloned().collect();
    presenter.show_header(&schema);

    // answering may reveal questions earlier in the schema, so rescan each time
    while let Some(question) = next_question(&schema, &store, &asked) {
        presenter.show_status(&schema, store.visible(), store.len());
        let index = asked.iter().filter(|id| store.visible().contains(*id)).count() + 1;
        let prompt = PromptContext::new(question, index, store.visible().len());
        asked.insert(question.id.clone());

        match prompt_question(&prompt, question, &presenter)? {
            Some(answer) => store.set(&schema, question.id.clone(), answer),
            None => store.clear(&schema, question.id.as_str()),
        };
    }

    let result = validate_with(&schema, store.answers(), store.visible(), &config.validation);
    describe_validation(&result);
    if !result.valid {
        return Err("validation failed".into());
    }

    let request = assemble_submission(&schema, store.answers(), candidate);
    presenter.show_completion(&request);
    Ok(())
}

fn next_question<'a>(
    schema: &'a Schema,
    store: &AnswerStore,
    asked: &BTreeSet<QuestionId>,
) -> Option<&'a Question> {
    schema.questions().find(|question| {
        store.visible().contains(&question.id) && !asked.contains(&question.id)
    })
}

fn prompt_question(
    prompt: &PromptContext,
    question: &Question,
    presenter: &PreviewPresenter,
) -> CliResult<Option<Answer>> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("input ended before the assessment was complete".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("preview aborted by user".into());
        }

        match parse_answer(question, trimmed) {
            Ok(value) => return Ok(value),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

/// Turns a line of input into an answer; blank input leaves the question
/// unanswered.
fn parse_answer(question: &Question, raw: &str) -> Result<Option<Answer>, AnswerParseError> {
    if raw.is_empty() {
        return Ok(None);
    }

    match &question.kind {
        QuestionKind::Short { .. } | QuestionKind::Long { .. } | QuestionKind::File => {
            Ok(Some(Answer::from(raw)))
        }
        QuestionKind::Single { options } => {
            parse_choice(options, raw).map(|choice| Some(Answer::Text(choice)))
        }
        QuestionKind::Multi { options } => raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| parse_choice(options, part))
            .collect::<Result<Vec<_>, _>>()
            .map(|choices| Some(Answer::Choices(choices))),
        QuestionKind::Numeric { .. } => parse_number(raw).map(Some),
    }
}

fn parse_choice(options: &[String], raw: &str) -> Result<String, AnswerParseError> {
    if options.is_empty() {
        return Ok(raw.to_string());
    }
    if let Some(option) = options.iter().find(|option| option.as_str() == raw) {
        return Ok(option.clone());
    }
    if let Ok(index) = raw.parse::<usize>()
        && let Some(option) = index.checked_sub(1).and_then(|index| options.get(index))
    {
        return Ok(option.clone());
    }
    Err(AnswerParseError::new(
        format!("'{}' is not one of the choices.", raw),
        Some(format!("one of: {}", options.join(", "))),
    ))
}

fn parse_number(raw: &str) -> Result<Answer, AnswerParseError> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Answer::from(value));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Answer::Number)
        .ok_or_else(|| {
            AnswerParseError::new(
                "Please enter a number.",
                Some("expected a finite number".to_string()),
            )
        })
}
