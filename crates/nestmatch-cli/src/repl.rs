use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use nestmatch_core::{
    load_config, SessionSnapshot, StepOutcome, SurveyRunner, SurveySession, TraitInferenceEngine,
};
use nestmatch_gateway::create_gateway;
use nestmatch_schema::{AnswerValue, ChatMessage, Identity, Role, SurveyOption};

/// What one line of input asks the survey to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Select(AnswerValue),
    Back,
    Quit,
    Unknown,
}

/// Numbers pick an option by its 1-based position. Anything else must match
/// an option's value or label, ignoring case.
pub fn parse_command(input: &str, options: &[SurveyOption]) -> ReplCommand {
    let input = input.trim();
    match input.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return ReplCommand::Quit,
        "back" => return ReplCommand::Back,
        _ => {}
    }

    if let Ok(position) = input.parse::<usize>() {
        return match position.checked_sub(1).and_then(|i| options.get(i)) {
            Some(option) => ReplCommand::Select(option.value.clone()),
            None => ReplCommand::Unknown,
        };
    }

    options
        .iter()
        .find(|o| {
            o.value.to_string().eq_ignore_ascii_case(input) || o.label.eq_ignore_ascii_case(input)
        })
        .map(|o| ReplCommand::Select(o.value.clone()))
        .unwrap_or(ReplCommand::Unknown)
}

pub async fn run_survey(root: &Path, identity: Identity, show_traits: bool) -> Result<()> {
    let config = load_config(&root.join("config"))?;
    let gateway = create_gateway(&config.main.submission)?;
    let session = SurveySession::with_prompts(
        Arc::new(config.script.clone()),
        identity,
        config.main.survey.prompts(),
    );
    let runner = SurveyRunner::new(session, gateway, config.main.survey.pacing());

    println!("nestmatch survey. Pick an option by number, type 'back' to revise, 'quit' to exit.");
    println!("---");

    runner.start().await?;
    let mut printed = 0;
    render(&runner.snapshot().await, &mut printed);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        if input.trim().is_empty() {
            continue;
        }

        let snapshot = runner.snapshot().await;
        let options = current_options(&snapshot);
        let step = match parse_command(&input, options) {
            ReplCommand::Quit => break,
            ReplCommand::Unknown => {
                eprintln!("Unrecognized choice: {}", input.trim());
                continue;
            }
            ReplCommand::Back => runner.back().await.map(|()| None),
            ReplCommand::Select(value) => runner.select_option(&value).await.map(Some),
        };

        match step {
            Ok(Some(StepOutcome::NextQuestionPending)) => {
                render(&runner.snapshot().await, &mut printed);
                runner.wait_for_next_question().await;
                render(&runner.snapshot().await, &mut printed);
            }
            Ok(Some(StepOutcome::Completed)) => {
                let snapshot = runner.snapshot().await;
                render(&snapshot, &mut printed);
                finish(&runner, &snapshot, show_traits, config.main.enrichment.seed).await;
                break;
            }
            Ok(None) => render(&runner.snapshot().await, &mut printed),
            Err(err) => eprintln!("Error: {err}"),
        }
    }

    Ok(())
}

async fn finish(
    runner: &SurveyRunner,
    snapshot: &SessionSnapshot,
    show_traits: bool,
    seed: Option<u64>,
) {
    match runner.wait_for_submission().await {
        Some(Ok(())) => println!("(answers submitted)"),
        Some(Err(err)) => eprintln!("Submission failed: {err:#}"),
        None => {}
    }

    if show_traits {
        let mut engine = TraitInferenceEngine::from_seed_option(seed);
        match engine.infer_from_answers(&snapshot.answers) {
            Ok(traits) => match serde_json::to_string_pretty(&traits) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("Error: {err}"),
            },
            Err(err) => eprintln!("Trait inference skipped: {err}"),
        }
    }
}

fn current_options(snapshot: &SessionSnapshot) -> &[SurveyOption] {
    snapshot
        .transcript
        .last()
        .and_then(|m| m.options.as_deref())
        .unwrap_or(&[])
}

/// Print transcript messages past `printed`. After a `back` the transcript
/// is shorter than what was shown, so the restored question is shown again.
fn render(snapshot: &SessionSnapshot, printed: &mut usize) {
    let transcript = &snapshot.transcript;
    if *printed > transcript.len() {
        println!("(back to question {})", snapshot.question_index + 1);
        *printed = transcript.len().saturating_sub(1);
    }
    for message in &transcript[*printed..] {
        print_message(message);
    }
    *printed = transcript.len();
}

fn print_message(message: &ChatMessage) {
    match message.role {
        Role::Assistant => println!("bot: {}", message.content),
        Role::User => println!("you: {}", message.content),
    }
    if let Some(options) = &message.options {
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {}", i + 1, option.label);
        }
    }
}
