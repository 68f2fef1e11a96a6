use std::collections::HashSet;

use anyhow::Result;

use verbcard_lib::mastery::Combination;
use verbcard_lib::practice::PracticeSession;

use crate::app::App;
use crate::commands::prompt;
use crate::render::terminal::{
    context_label, paint, render_choices, render_front, render_session_stats, Color,
};

/// Multiple-choice practice
pub async fn run(app: &App, tenses: Option<&str>, use_color: bool) -> Result<()> {
    let mode = app.practice_mode(tenses)?;
    let store = app.open_store(&mode)?;
    let source = app.dataset_source(&mode)?;

    let mut session = PracticeSession::start(store, &source, mode, app.tracker()).await?;
    if let Some(outcome) = session.sync_outcome() {
        println!("{}", paint(&outcome.status_message(), Color::GRAY, use_color));
    }

    let mut rng = rand::thread_rng();
    // Combinations with no stored answer can't be quizzed
    let mut unanswerable: HashSet<Combination> = HashSet::new();

    loop {
        if unanswerable.len() >= session.rotation().len() {
            println!("{}", paint(&session.status_line(), Color::YELLOW, use_color));
            break;
        }
        let Some(card) = session.next_card(&mut rng) else {
            println!("{}", paint(&session.status_line(), Color::YELLOW, use_color));
            break;
        };
        let Some(choices) = session.choices(&mut rng) else {
            unanswerable.insert(Combination::new(card.item_key.clone(), card.context.clone()));
            continue;
        };

        println!("{}", paint(&session.status_line(), Color::GRAY, use_color));
        println!("{}", render_front(&card, use_color));
        println!("{}", render_choices(&choices));

        let picked = loop {
            match prompt(&format!("1-{} (q to quit) > ", choices.options.len()))?.as_deref() {
                None | Some("q") => {
                    finish(&session, use_color);
                    return Ok(());
                }
                Some(input) => match input.parse::<usize>() {
                    Ok(n) if (1..=choices.options.len()).contains(&n) => break n - 1,
                    _ => continue,
                },
            }
        };

        let correct = choices.is_correct(picked);
        if correct {
            println!("{}", paint("✓ Correct!", Color::GREEN, use_color));
        } else {
            println!(
                "{}",
                paint(
                    &format!(
                        "✗ {} {}: {}",
                        card.item_key,
                        context_label(&card.context),
                        choices.correct_answer()
                    ),
                    Color::RED,
                    use_color
                )
            );
        }
        session.answer(correct)?;
        println!();
    }

    finish(&session, use_color);
    Ok(())
}

fn finish(session: &PracticeSession, use_color: bool) {
    println!(
        "\n{}",
        paint(&render_session_stats(session.session_stats()), Color::BOLD, use_color)
    );
}
