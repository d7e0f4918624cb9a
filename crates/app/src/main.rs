use std::fmt;
use std::sync::Arc;

use quiz_core::{OptionMark, Position, QuizSession, parse_quiz};
use services::{
    ContinueOutcome, HttpQuizSource, HttpTutoringService, QuizLoopService, QuizRequest,
    ServiceConfig,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingTopic,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingTopic => write!(f, "--url requires --topic or LEARN_QUIZ_TOPIC"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--file <path>] [--url <website> --topic <topic>]");
    eprintln!();
    eprintln!("Without --file or --url the quiz is generated from an empty conversation.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_API_BASE_URL (default http://localhost:8000), LEARN_QUIZ_TOPIC, RUST_LOG");
}

/// Where the quiz text comes from.
enum Origin {
    File(String),
    Remote(QuizRequest),
}

struct Args {
    origin: Origin,
    config: ServiceConfig,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut config = ServiceConfig::from_env();
        let mut file = None;
        let mut website_url = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" => file = Some(require_value(args, "--file")?),
                "--url" => website_url = Some(require_value(args, "--url")?),
                "--topic" => config = config.with_topic(require_value(args, "--topic")?),
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let origin = match (file, website_url) {
            (Some(path), _) => Origin::File(path),
            (None, Some(website_url)) => {
                let topic = config.topic.clone().ok_or(ArgsError::MissingTopic)?;
                Origin::Remote(QuizRequest::FromWebsite { website_url, topic })
            }
            (None, None) => Origin::Remote(QuizRequest::FromConversation {
                chat_history: Vec::new(),
            }),
        };

        Ok(Some(Self { origin, config }))
    }
}

async fn load_session(
    service: &QuizLoopService,
    origin: &Origin,
) -> Result<QuizSession, Box<dyn std::error::Error>> {
    match origin {
        Origin::File(path) => {
            debug!(%path, "reading quiz text from file");
            let raw = tokio::fs::read_to_string(path).await?;
            let questions = parse_quiz(&raw);
            if questions.is_empty() {
                return Err("failed to load questions".into());
            }
            Ok(QuizSession::new(questions)?)
        }
        Origin::Remote(request) => {
            let ticket = service.begin_attempt();
            Ok(service.start_quiz(ticket, request).await?)
        }
    }
}

fn show_question(session: &QuizSession, index: usize) {
    let Some(question) = session.questions().get(index) else {
        return;
    };
    println!();
    println!(
        "Question {} of {} | Score: {}",
        index + 1,
        session.questions().len(),
        session.score()
    );
    println!("{}. {}", index + 1, question.prompt);

    let marks = session.option_marks(index);
    for (position, option) in question.options.iter().enumerate() {
        let suffix = match marks.as_ref().and_then(|marks| marks.get(position)) {
            Some(OptionMark::Correct | OptionMark::ChosenCorrect) => " (correct answer)",
            Some(OptionMark::ChosenIncorrect) => " (incorrect)",
            Some(OptionMark::Plain) | None => "",
        };
        println!("  {option}{suffix}");
    }

    if let Some(disclosure) = session.disclosure(index) {
        println!("Correct answer: option {}", disclosure.expected.label());
        println!(":n next, :p previous, :q quit");
    } else {
        println!("Choose an option label, :p previous, :q quit");
    }
}

/// One line of learner input. Navigation is prefixed with `:` so that any
/// option label, including `N`, `P` or `Q`, can be typed as an answer.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Blank,
    Next,
    Previous,
    Quit,
    Choose(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Self::Blank,
            ":n" | ":next" => Self::Next,
            ":p" | ":prev" => Self::Previous,
            ":q" | ":quit" => Self::Quit,
            label => Self::Choose(label),
        }
    }
}

async fn play(
    session: &mut QuizSession,
    input: &mut Lines<BufReader<Stdin>>,
) -> Result<bool, Box<dyn std::error::Error>> {
    while let Position::Question(index) = session.position() {
        show_question(session, index);
        let Some(line) = input.next_line().await? else {
            return Ok(false);
        };
        let result = match Input::parse(&line) {
            Input::Blank => continue,
            Input::Quit => return Ok(false),
            Input::Next => session.advance().map(|_| ()),
            Input::Previous => session.retreat().map(|_| ()),
            Input::Choose(label) => session.select_answer(label).map(|_| ()),
        };
        if let Err(err) = result {
            println!("{err}");
        }
    }
    Ok(true)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let Some(args) = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    let service = QuizLoopService::new(
        Arc::new(HttpQuizSource::new(args.config.clone())),
        Arc::new(HttpTutoringService::new(args.config.clone())),
    );

    let mut session = load_session(&service, &args.origin).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    if !play(&mut session, &mut input).await? {
        return Ok(());
    }

    let summary = session.summary()?;
    println!();
    println!("Quiz completed! Your score: {} / {}", summary.score, summary.total);

    match service.finish(&session, args.config.topic.as_deref()).await? {
        ContinueOutcome::NothingToRemediate => println!("No missed questions. Well done."),
        ContinueOutcome::Tutoring(reply) => {
            println!();
            println!("{}", reply.response);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(LevelFilter::WARN.into()),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
