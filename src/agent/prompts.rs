//! Prompt text shared by the invokers and the takeaway extractor.

use crate::conversation::{ConversationHistory, Role};

/// Built-in User agent instructions, used when no custom user agent is configured.
pub const DEFAULT_USER_INSTRUCTIONS: &str = "You are a User Agent simulating a human researcher. \
Your overall goal is: \"${userAgentGoal}\". \
You are in a conversation with an expert. Your only task is to decide the single, specific, \
open-ended question to ask the expert next so that you make progress towards your goal. \
Pay most attention to the expert's latest answer: probe deeper, ask for clarification, \
or open a new angle that serves the goal.";

pub const DEFAULT_USER_NAME: &str = "UserAgent";
pub const DEFAULT_EXPERT_NAME: &str = "ExpertAgent";

const EMPTY_CONVERSATION: &str = "(The conversation has not started yet.)";

const USER_TASK: &str = "Ask exactly one follow-up question that moves you closer to your goal. \
Output only the question text itself, with no preamble, explanation or quotation marks.";

const EXPERT_TASK: &str = "Answer the user's latest question in character, \
drawing on your persona's knowledge and point of view.";

/// Task appended to the prompt for a role's turn.
pub fn task_suffix(role: Role) -> &'static str {
    match role {
        Role::User => USER_TASK,
        Role::Expert => EXPERT_TASK,
    }
}

/// Input for a turn: rendered history followed by the role's task.
pub fn turn_input(history: &ConversationHistory, role: Role, goal: &str) -> String {
    let transcript = if history.is_empty() {
        EMPTY_CONVERSATION.to_string()
    } else {
        history.render_as_text()
    };

    let mut input = format!("Conversation so far:\n\n{transcript}\n\n");
    if role == Role::User {
        input.push_str(&format!("Your goal: \"{goal}\"\n\n"));
    }
    input.push_str(task_suffix(role));
    input
}

/// Input for the takeaway call.
pub fn takeaway_input(transcript: &str, goal: &str, expert_description: &str) -> String {
    format!(
        "Below is the transcript of a conversation between a user and an expert \
         ({expert_description}). The user's goal was: \"{goal}\".\n\n\
         Transcript:\n\n{transcript}\n\n\
         Distill the key takeaways, insights and conclusions relevant to that goal as concise \
         bullet points. Only include information the Expert provided in the transcript; do not \
         add new facts and do not refer to yourself."
    )
}
