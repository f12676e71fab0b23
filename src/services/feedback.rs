use crate::error::Result;

/// Produces coaching text from a numeric score.
pub trait FeedbackGenerator: Send + Sync {
    fn feedback(&self, song_id: &str, score: f64) -> Result<String>;
}

impl<F> FeedbackGenerator for F
where
    F: Fn(&str, f64) -> Result<String> + Send + Sync,
{
    fn feedback(&self, song_id: &str, score: f64) -> Result<String> {
        self(song_id, score)
    }
}

/// Offline coach that picks encouragement by score band.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreBandFeedback;

impl FeedbackGenerator for ScoreBandFeedback {
    fn feedback(&self, song_id: &str, score: f64) -> Result<String> {
        let text = if score > 90.0 {
            format!(
                "Wonderful work on '{song_id}'! Your pitch stayed locked to the melody \
                 with real consistency. Keep that control and start playing with dynamics."
            )
        } else if score >= 70.0 {
            format!(
                "Nice effort on '{song_id}', you are on the right track. Pick the phrase \
                 that felt least steady and sing it slowly against the original a few times."
            )
        } else {
            format!(
                "Thanks for singing '{song_id}', every take builds your ear. A great next \
                 step is to hum the main melody slowly to settle the notes in your mind."
            )
        };
        Ok(text)
    }
}

/// Markdown report shown to the singer; the feedback section is omitted when absent.
pub fn render_report(score: f64, feedback: Option<&str>) -> String {
    let mut report = format!(
        "## Vocal Analysis Report\n\n### Your Pitch Accuracy Score: **{score:.2}%**\n"
    );
    if let Some(text) = feedback {
        report.push_str("\n---\n\n### Vocal Coach Feedback\n\n");
        report.push_str(text);
        report.push('\n');
    }
    report
}
