use anyhow::Result;
use jarvis_assistant::Assistant;

/// Answer one question and print it.
pub async fn run(assistant: &Assistant, question: &[String], json: bool) -> Result<()> {
    let question = question.join(" ");
    let answer = assistant.ask(&question).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", answer.text);
    }
    Ok(())
}
