//! Prompt templates for the refinement loop
//!
//! The initial prompt is chosen by [`InfoClass`] through an exhaustive
//! match, so adding an information class forces a template decision at
//! compile time.

use cwm_core::InfoClass;

/// The six-function interface every candidate must implement
const FUNCTION_SIGNATURES: &str = r#"# START FUNCTION SIGNATURE
Action = str
State = dict[str, Any]
PlayerObservation = dict[str, Any]

def apply_action(state: State, action: Action) -> State:
    '''Returns the new state after an action has been taken.'''

def get_current_player(state: State) -> int:
    '''Returns the current player id, -1 for chance and -4 for terminal.'''

def get_player_name(player_id: int) -> str:
    '''Returns the player's name, 'chance' for -1 and 'terminal' for -4.'''

def get_rewards(state: State) -> list[float]:
    '''Returns the reward of every player for the last action.'''

def get_legal_actions(state: State) -> list[Action]:
    '''Returns the actions that can be taken in the current state.'''

def get_observations(state: State) -> list[PlayerObservation]:
    '''Returns one observation per player.'''
# END FUNCTION SIGNATURE
"#;

/// Output rules shared by both initial templates
const OUTPUT_CONSTRAINTS: &str = "Constraints:\n\
1. Do not repeat the unit tests in your output.\n\
2. Only return the functional code.\n\
3. Do not leave placeholders.\n\
4. Include every import you use (e.g. typing, random, copy).\n\
5. Enclose your code in a markdown block ```python ... ```.\n";

/// Build the first prompt of a run
pub fn initial_prompt(info_class: InfoClass, game: &str, rules: &str, tests: &str) -> String {
    let observation_rules = match info_class {
        InfoClass::Perfect => perfect_information_rules(),
        InfoClass::Imperfect => imperfect_information_rules(),
    };

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are an expert Python programmer building the game of {}.\n",
        game
    ));
    prompt.push_str("Here is a description of the game:\n");
    prompt.push_str(rules.trim_end());
    prompt.push_str("\n\n");

    prompt.push_str("Implement the following Python functions:\n");
    prompt.push_str(FUNCTION_SIGNATURES);
    prompt.push('\n');

    prompt.push_str(observation_rules);
    prompt.push('\n');

    prompt.push_str("Your code must satisfy the following unit tests.\n");
    prompt.push_str("# START UNIT TESTS\n");
    prompt.push_str(tests.trim_end());
    prompt.push_str("\n# END UNIT TESTS\n\n");

    prompt.push_str(OUTPUT_CONSTRAINTS);
    prompt
}

fn perfect_information_rules() -> &'static str {
    "This is a perfect-information game: every player sees the whole state.\n\
     get_observations must still return a list with one entry per player, \
     each entry being the full state.\n"
}

fn imperfect_information_rules() -> &'static str {
    "This is an imperfect-information game: players hold private information \
     (for example hidden cards).\n\
     get_observations must return a list with one entry per player. Each \
     entry contains only what that player is allowed to see; never reveal \
     another player's private information.\n\
     Chance events (such as dealing) happen in states where \
     get_current_player returns -1, and their outcomes are legal actions \
     of the chance player.\n"
}

/// Build a prompt asking the model to fix `code` given its failure trace
pub fn refinement_prompt(diagnostic: &str, code: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("The previous implementation failed the unit tests.\n");
    prompt.push_str("Here is the error trace:\n");
    prompt.push_str("```\n");
    prompt.push_str(diagnostic.trim_end());
    prompt.push_str("\n```\n\n");

    prompt.push_str("The original code was:\n");
    prompt.push_str("```python\n");
    prompt.push_str(code.trim_end());
    prompt.push_str("\n```\n\n");

    prompt.push_str(
        "Fix the errors and return the full, corrected code in a single ```python block.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_prompt_embeds_inputs() {
        let prompt = initial_prompt(
            InfoClass::Perfect,
            "tic_tac_toe",
            "Three in a row wins.",
            "assert get_current_player(state) == 0",
        );

        assert!(prompt.contains("game of tic_tac_toe"));
        assert!(prompt.contains("Three in a row wins."));
        assert!(prompt.contains("assert get_current_player(state) == 0"));
        assert!(prompt.contains("def get_observations"));
        assert!(prompt.contains("perfect-information"));
        assert!(prompt.contains("```python"));
    }

    #[test]
    fn test_templates_differ_by_info_class() {
        let perfect = initial_prompt(InfoClass::Perfect, "g", "r", "t");
        let imperfect = initial_prompt(InfoClass::Imperfect, "g", "r", "t");

        assert_ne!(perfect, imperfect);
        assert!(imperfect.contains("imperfect-information"));
        assert!(imperfect.contains("private information"));
        assert!(!perfect.contains("imperfect-information"));
    }

    #[test]
    fn test_refinement_prompt_embeds_trace_and_code() {
        let prompt = refinement_prompt(
            "NameError: name 'get_rewards' is not defined\n",
            "def apply_action(state, action):\n    return state\n",
        );

        assert!(prompt.contains("failed the unit tests"));
        assert!(prompt.contains("NameError: name 'get_rewards' is not defined\n```"));
        assert!(prompt.contains("def apply_action(state, action):\n    return state\n```"));
    }

    #[test]
    fn test_refinement_prompt_with_empty_code() {
        let prompt = refinement_prompt("SyntaxError", "");
        assert!(prompt.contains("```python\n\n```"));
    }
}
