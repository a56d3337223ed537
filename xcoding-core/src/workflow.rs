//! Diagnostic workflow rendering
//!
//! Produces the single-job workflow used to exercise remote `uses:` actions
//! on the executor.

/// Task name of the only job in the diagnostic workflow
pub const DIAGNOSTIC_TASK: &str = "job-1";

/// Renders a workflow whose first step runs the action at `uses_ref`
pub fn remote_action_workflow(uses_ref: &str) -> String {
    let lines = [
        "name: action1".to_string(),
        "'on':".to_string(),
        "  workflow_dispatch: {}".to_string(),
        "jobs:".to_string(),
        format!("  {}:", DIAGNOSTIC_TASK),
        "    name: Job 1".to_string(),
        "    runs-on: ubuntu-latest".to_string(),
        "    container: ipowerink/python-tree".to_string(),
        "    env:".to_string(),
        "      XC_ACTIONS_FORCE_REFRESH: 'true'".to_string(),
        "    steps:".to_string(),
        "      - name: github_action_demo".to_string(),
        format!("        uses: {}", uses_ref),
        "        with:".to_string(),
        "          MESSAGE: demo".to_string(),
        "      - name: echo hello".to_string(),
        "        run: echo \"Hello1234\"".to_string(),
    ];

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_uses_given_ref() {
        let yaml = remote_action_workflow("RuningBird/actions-test@v17");
        assert!(yaml.contains("        uses: RuningBird/actions-test@v17\n"));
        assert!(yaml.starts_with("name: action1\n"));
        assert!(yaml.ends_with("run: echo \"Hello1234\"\n"));
    }

    #[test]
    fn test_workflow_declares_diagnostic_task() {
        let yaml = remote_action_workflow("owner/repo@v1");
        assert!(yaml.contains("\n  job-1:\n"));
    }
}
