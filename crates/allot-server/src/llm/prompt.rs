// crates/allot-server/src/llm/prompt.rs
// Allocation prompt shared by every provider

use crate::allocation::input::AllocationInput;

/// System slot text for vendors that carry one (OpenAI, Anthropic)
pub const SYSTEM_INSTRUCTION: &str = "You are an AI system designed to allocate students to supervisors for academic projects. Provide responses in valid JSON format only.";

const INTRO: &str = "You are an AI system designed to allocate students to supervisors for academic projects. \
Your task is to match students with the most suitable supervisors based on project specializations, \
supervisor expertise, and capacity constraints.

Please analyze the following data and provide allocation recommendations:";

const RULES: &str = "ALLOCATION RULES:
1. Each student can only be allocated to one supervisor
2. Supervisors have maximum capacity limits (max_students field)
3. Prioritize matching project specializations with supervisor specializations
4. Consider department alignment (bonus points for same department)
5. Distribute workload evenly among supervisors
6. Ensure all allocations are feasible and respect constraints";

const OUTPUT_SHAPE: &str = r#"Please provide your response in the following JSON format:
{
    "allocations": [
        {
            "student_id": 1,
            "supervisor_id": 2,
            "project_id": 3,
            "match_score": 85.5,
            "reasoning": "Strong match in AI specialization, same department, supervisor has capacity"
        }
    ],
    "summary": {
        "total_allocations": 10,
        "average_match_score": 82.3,
        "unallocated_students": 2,
        "capacity_utilization": "85%"
    },
    "recommendations": [
        "Consider adding more AI specialists to handle demand",
        "Some supervisors are underutilized and could take more students"
    ]
}"#;

const JSON_ONLY: &str = "IMPORTANT: Respond ONLY with valid JSON. Do not include any explanatory text before or after the JSON response.";

/// Render the allocation prompt. Deterministic for a given input.
pub fn build_allocation_prompt(input: &AllocationInput) -> String {
    let students = pretty(&input.students);
    let projects = pretty(&input.projects);
    let supervisors = pretty(&input.supervisors);

    format!(
        "{INTRO}\n\nSTUDENTS DATA:\n{students}\n\nPROJECTS DATA:\n{projects}\n\nSUPERVISORS DATA:\n{supervisors}\n\n{RULES}\n\n{OUTPUT_SHAPE}\n\n{JSON_ONLY}"
    )
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    // Plain structs of strings and numbers always serialise
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}
