//! Story navigation: advancing, skipping and answering
//!
//! The navigator owns the script and the progress record. Timestamps are
//! passed in as epoch milliseconds so sessions can be replayed.

use super::progress::{AnswerRecord, DialogueLine, ProgressStore, StoryProgress};
use super::scene::{Scene, Script};

/// Speaker name used for the player's own answers in the log
pub const PLAYER_LABEL: &str = "You typed:";

pub struct StoryNavigator {
    script: Script,
    progress: StoryProgress,
}

impl StoryNavigator {
    pub fn new(story_id: &str, script: Script, now: f64) -> Self {
        let progress = StoryProgress::new(story_id, script.first().id, now);
        Self { script, progress }
    }

    /// Continue saved progress if there is usable progress for this story
    pub fn resume(
        story_id: &str,
        script: Script,
        store: &mut impl ProgressStore,
        now: f64,
    ) -> Self {
        match store.load_progress(story_id) {
            Some(progress) if progress.is_ended() => {
                log::info!("Story '{}' was finished, starting over", story_id);
                store.clear_progress(story_id);
                Self::new(story_id, script, now)
            }
            Some(progress) if script.get(progress.current_scene_id).is_none() => {
                log::warn!(
                    "Saved scene {} is not in story '{}', starting over",
                    progress.current_scene_id,
                    story_id
                );
                store.clear_progress(story_id);
                Self::new(story_id, script, now)
            }
            Some(progress) => Self { script, progress },
            None => Self::new(story_id, script, now),
        }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn progress(&self) -> &StoryProgress {
        &self.progress
    }

    pub fn is_ended(&self) -> bool {
        self.progress.is_ended()
    }

    /// `None` once the story has ended
    pub fn current_scene(&self) -> Option<&Scene> {
        if self.is_ended() {
            return None;
        }
        self.script.get(self.progress.current_scene_id)
    }

    /// Append to the dialogue log unless it repeats the last line
    pub fn record_dialogue(&mut self, character: &str, dialogue: &str) {
        let history = &mut self.progress.dialogue_history;
        if history
            .last()
            .is_some_and(|l| l.character == character && l.dialogue == dialogue)
        {
            return;
        }
        history.push(DialogueLine {
            character: character.to_string(),
            dialogue: dialogue.to_string(),
        });
    }

    /// Move on from the current scene, to `next_override` if given.
    /// Ending scenes close the story.
    pub fn advance(&mut self, next_override: Option<u32>, now: f64) {
        let Some(scene) = self.current_scene().cloned() else {
            return;
        };
        self.record_scene(&scene);
        if scene.is_ending() {
            self.end_story(now);
            return;
        }
        let target = next_override.or_else(|| self.script.following(scene.id).map(|s| s.id));
        self.goto(target, now);
    }

    /// Fast-forward through dialogue, stopping on the next question or ending.
    /// Skipped lines are still logged. Does nothing on a question scene.
    pub fn skip(&mut self, now: f64) {
        let Some(scene) = self.current_scene().cloned() else {
            return;
        };
        if scene.is_question() {
            log::warn!("Cannot skip during a question scene");
            return;
        }
        let Some(start) = self.script.position(scene.id) else {
            self.end_story(now);
            return;
        };
        self.record_scene(&scene);

        let rest = &self.script.scenes()[start + 1..];
        let stop = rest.iter().position(|s| s.is_question() || s.is_ending());
        let passed = stop.unwrap_or(rest.len());
        let skipped: Vec<(String, String)> = rest[..passed]
            .iter()
            .filter(|s| !s.dialogue.is_empty())
            .map(|s| (s.character.clone(), s.dialogue.clone()))
            .collect();
        let landing = stop.map(|i| rest[i].id);

        for (character, dialogue) in &skipped {
            self.record_dialogue(character, dialogue);
        }
        log::debug!("Skipped {} scenes", passed);

        match landing {
            Some(id) => self.progress.current_scene_id = id,
            None => self.end_story(now),
        }
    }

    /// Check a typed answer on a question scene and branch.
    ///
    /// Returns whether the answer was correct, or `None` if nothing was
    /// submitted (blank input, not a question, story over).
    pub fn submit_answer(&mut self, input: &str, now: f64) -> Option<bool> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        let scene = self.current_scene().cloned()?;
        let Some(key) = scene.answer_key() else {
            log::warn!("Answer submitted on non-question scene {}", scene.id);
            return None;
        };

        let correct = key.matches(trimmed);
        self.progress.answers.push(AnswerRecord {
            scene_id: scene.id,
            chosen_text: trimmed.to_string(),
            is_correct: correct,
            timestamp: now,
        });
        self.record_scene(&scene);
        let entry = if correct {
            format!("[{}]", trimmed)
        } else {
            format!("[{}] - No match found", trimmed)
        };
        self.record_dialogue(PLAYER_LABEL, &entry);

        match key.next_for(correct) {
            Some(next) => self.goto(Some(next), now),
            None => {
                log::error!(
                    "Question scene {} has no next scene for a {} answer",
                    scene.id,
                    if correct { "correct" } else { "wrong" }
                );
                self.end_story(now);
            }
        }
        Some(correct)
    }

    pub fn end_story(&mut self, now: f64) {
        if self.progress.end_time.is_none() {
            log::info!("Story '{}' ended", self.progress.story_id);
            self.progress.end_time = Some(now);
        }
    }

    /// Save while in progress; clear once ended. Failures are only logged.
    pub fn persist(&self, store: &mut impl ProgressStore) {
        if self.is_ended() {
            store.clear_progress(&self.progress.story_id);
            return;
        }
        if let Err(e) = store.save_progress(&self.progress) {
            log::error!("Failed to save story progress: {}", e);
        }
    }

    fn goto(&mut self, target: Option<u32>, now: f64) {
        match target {
            Some(id) if self.script.get(id).is_some() => self.progress.current_scene_id = id,
            Some(id) => {
                log::error!("Attempted to navigate to non-existent scene {}", id);
                self.end_story(now);
            }
            None => self.end_story(now),
        }
    }

    fn record_scene(&mut self, scene: &Scene) {
        if !scene.dialogue.is_empty() {
            self.record_dialogue(&scene.character, &scene.dialogue);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::story::progress::StorageProgressStore;

    const SCRIPT: &str = r#"[
        {"id": 0, "character": "Elara", "dialogue": "This project is a setback."},
        {"id": 1, "character": "Julian", "dialogue": "Indeed."},
        {"id": 2, "character": "Elara", "dialogue": "Quite daunting."},
        {"id": 3, "type": "question", "character": "Julian", "dialogue": "What is it called?",
         "answer": {"text": "setback", "correctIndex": 4, "incorrectIndex": 99}},
        {"id": 4, "character": "Elara", "dialogue": "Precisely."},
        {"id": 5, "type": "correctED", "character": "Elara", "dialogue": "Well done."},
        {"id": 99, "type": "wrongED", "character": "Elara", "dialogue": "Not quite."}
    ]"#;

    fn navigator() -> StoryNavigator {
        StoryNavigator::new("c1", Script::from_json(SCRIPT).unwrap(), 0.0)
    }

    fn lines(nav: &StoryNavigator) -> Vec<&str> {
        nav.progress()
            .dialogue_history
            .iter()
            .map(|l| l.dialogue.as_str())
            .collect()
    }

    #[test]
    fn test_advance_walks_in_order_and_logs() {
        let mut nav = navigator();
        nav.advance(None, 1.0);
        assert_eq!(nav.current_scene().unwrap().id, 1);
        nav.advance(Some(3), 2.0);
        assert_eq!(nav.current_scene().unwrap().id, 3);
        assert_eq!(lines(&nav), vec!["This project is a setback.", "Indeed."]);
    }

    #[test]
    fn test_skip_stops_before_question() {
        let mut nav = navigator();
        nav.skip(1.0);
        assert_eq!(nav.current_scene().unwrap().id, 3);
        assert_eq!(
            lines(&nav),
            vec!["This project is a setback.", "Indeed.", "Quite daunting."]
        );
        nav.skip(2.0);
        assert_eq!(nav.current_scene().unwrap().id, 3);
    }

    #[test]
    fn test_correct_answer_branches_and_logs() {
        let mut nav = navigator();
        nav.skip(1.0);
        assert_eq!(nav.submit_answer("  SetBack ", 5.0), Some(true));
        assert_eq!(nav.current_scene().unwrap().id, 4);
        let answer = &nav.progress().answers[0];
        assert_eq!(answer.scene_id, 3);
        assert_eq!(answer.chosen_text, "SetBack");
        assert_eq!(answer.timestamp, 5.0);
        let last = nav.progress().dialogue_history.last().unwrap();
        assert_eq!(last.character, PLAYER_LABEL);
        assert_eq!(last.dialogue, "[SetBack]");
    }

    #[test]
    fn test_wrong_answer_reaches_wrong_ending() {
        let mut nav = navigator();
        nav.skip(1.0);
        assert_eq!(nav.submit_answer("failure", 2.0), Some(false));
        assert_eq!(nav.current_scene().unwrap().id, 99);
        assert_eq!(lines(&nav).last(), Some(&"[failure] - No match found"));

        nav.advance(None, 3.0);
        assert!(nav.is_ended());
        assert_eq!(nav.progress().end_time, Some(3.0));
        assert!(nav.current_scene().is_none());
    }

    #[test]
    fn test_blank_or_misplaced_answers_are_ignored() {
        let mut nav = navigator();
        assert_eq!(nav.submit_answer("setback", 1.0), None);
        nav.skip(1.0);
        assert_eq!(nav.submit_answer("   ", 1.0), None);
        assert!(nav.progress().answers.is_empty());
    }

    #[test]
    fn test_missing_scene_ends_story() {
        let mut nav = navigator();
        nav.advance(Some(42), 7.0);
        assert!(nav.is_ended());
        assert_eq!(nav.progress().end_time, Some(7.0));
    }

    #[test]
    fn test_consecutive_duplicates_are_collapsed() {
        let mut nav = navigator();
        nav.record_dialogue("A", "hi");
        nav.record_dialogue("A", "hi");
        nav.record_dialogue("B", "hi");
        nav.record_dialogue("A", "hi");
        assert_eq!(nav.progress().dialogue_history.len(), 3);
    }

    #[test]
    fn test_persist_and_resume() {
        let mut store = StorageProgressStore::new(MemoryStore::new());
        let mut nav = navigator();
        nav.skip(1.0);
        nav.persist(&mut store);

        let script = Script::from_json(SCRIPT).unwrap();
        let resumed = StoryNavigator::resume("c1", script.clone(), &mut store, 9.0);
        assert_eq!(resumed.current_scene().unwrap().id, 3);
        assert_eq!(resumed.progress().start_time, 0.0);

        nav.end_story(2.0);
        nav.persist(&mut store);
        assert!(store.inner().is_empty());
        let fresh = StoryNavigator::resume("c1", script, &mut store, 9.0);
        assert_eq!(fresh.current_scene().unwrap().id, 0);
        assert_eq!(fresh.progress().start_time, 9.0);
    }

    #[test]
    fn test_save_failure_does_not_panic() {
        let mut store = StorageProgressStore::new(MemoryStore::read_only());
        navigator().persist(&mut store);
        assert!(store.inner().is_empty());
    }
}
