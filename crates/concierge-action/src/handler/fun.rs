//! Dice, coins, jokes and random numbers.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::ActionError;
use crate::handler::{required, ActionHandler};
use crate::types::{Intent, IntentKind};

pub const JOKES: &[&str] = &[
    "Why don't scientists trust atoms? Because they make up everything!",
    "Why did the scarecrow win an award? Because he was outstanding in his field!",
    "What do you call fake spaghetti? An impasta!",
    "Why was the math book sad? Because it had too many problems.",
    "Why did the bicycle fall over? Because it was two-tired!",
    "What do you call a fish with no eyes? Fsh!",
    "Parallel lines have so much in common. It's a shame they'll never meet.",
];

pub struct FunHandler;

fn random_number(min: &str, max: &str) -> Result<String, ActionError> {
    let parse = |v: &str| v.trim().parse::<i64>();
    let (Ok(min), Ok(max)) = (parse(min), parse(max)) else {
        return Err(ActionError::InvalidInput(
            "Please provide two valid whole numbers for the range, for example, '1 and 100'."
                .to_string(),
        ));
    };
    if min >= max {
        return Err(ActionError::InvalidInput(
            "For a random number range, the first number (minimum) should be smaller than \
             the second (maximum)."
                .to_string(),
        ));
    }
    let value = rand::thread_rng().gen_range(min..=max);
    Ok(format!(
        "A random number between {} and {} is: {}.",
        min, max, value
    ))
}

#[async_trait]
impl ActionHandler for FunHandler {
    fn kinds(&self) -> &'static [IntentKind] {
        &[
            IntentKind::RollDice,
            IntentKind::FlipCoin,
            IntentKind::TellJoke,
            IntentKind::RandomNumber,
        ]
    }

    async fn execute(&self, intent: &Intent) -> Result<String, ActionError> {
        match intent.kind {
            IntentKind::RollDice => Ok(format!(
                "I rolled a {}!",
                rand::thread_rng().gen_range(1..=6)
            )),
            IntentKind::FlipCoin => {
                let side = if rand::thread_rng().gen_bool(0.5) {
                    "Heads"
                } else {
                    "Tails"
                };
                Ok(format!("The coin landed on: {}!", side))
            }
            IntentKind::TellJoke => Ok(JOKES
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(JOKES[0])
                .to_string()),
            IntentKind::RandomNumber => {
                random_number(required(intent, "min")?, required(intent, "max")?)
            }
            other => Err(ActionError::UnregisteredHandler(other)),
        }
    }

    fn describe(&self, intent: &Intent) -> String {
        match intent.kind {
            IntentKind::RandomNumber => format!(
                "Random number between {} and {}",
                intent.param("min").unwrap_or("?"),
                intent.param("max").unwrap_or("?")
            ),
            kind => kind.to_string(),
        }
    }
}
