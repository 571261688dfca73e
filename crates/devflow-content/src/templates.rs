//! Prompt table for every content-service role.
//!
//! Each template body uses `{name}` placeholders filled from the
//! request variables. The rendered prompt always ends with the JSON
//! shape instruction for the template's payload kind, so any
//! OpenAI-compatible model can be driven in json_object mode.

use devflow_core::content::{ContentRequest, PayloadKind, TemplateId};

fn body(template: TemplateId) -> &'static str {
    match template {
        TemplateId::StoryGeneration => {
            "You are a seasoned Agile Product Manager with deep expertise in crafting \
             user-centric user stories.\n\n\
             Generate 6 well-defined user stories based on the following product requirement:\n\n\
             \"{requirements}\"\n\n\
             Guidelines for each story:\n\
             - Format: As a <type of user>, I want to <goal> so that <benefit>.\n\
             - Focus on user value, not implementation details.\n\
             - Each story must be concise, independent, testable, and cover a different \
             functional aspect of the requirement.\n\
             Think broadly about user roles (admin, end user, guest) for well-rounded coverage."
        }
        TemplateId::StoryRevision => {
            "You are an expert in generating user stories. The Product Owner has provided \
             feedback.\n\n\
             Feedback:\n{feedback}\n\n\
             Previously generated user stories:\n{user_stories}\n\n\
             Regenerate the user stories so they incorporate these improvements.\n\
             Format: As a <user>, I want to <action> so that <benefit>."
        }
        TemplateId::StoryReview => {
            "You are a senior Product Owner with over 10 years of experience in Agile \
             development and user story evaluation.\n\n\
             Review the following user stories against the INVEST criteria (Independent, \
             Negotiable, Valuable, Estimable, Small, Testable):\n\n{user_stories}\n\n\
             Decide Approved / Not Approved for the set as a whole, and give point-wise \
             feedback covering clarity, measurable user value, acceptance criteria, \
             overlaps or dependencies, and whether the stories collectively address the \
             core functionality. Do not restate the original stories."
        }
        TemplateId::DesignGeneration => {
            "You are a senior software architect converting user stories into detailed \
             functional and technical design documents.\n\n\
             User Stories:\n{user_stories}\n\n\
             Produce two sections:\n\
             - Functional Design: feature summaries, user flows, functional requirements, \
             edge cases and validation rules, assumptions and constraints.\n\
             - Technical Design: system architecture and components, APIs and data \
             contracts, data models, technology stack, security and performance \
             considerations, integration points.\n\
             Keep both clear, actionable, and free of implementation ambiguity."
        }
        TemplateId::DesignRevision => {
            "You are a senior technical architect correcting design documents based on \
             review feedback.\n\n\
             Review feedback:\n{feedback}\n\n\
             Current documents:\n{design_document}\n\n\
             Update the design documents to address every issue while maintaining clarity \
             and structure."
        }
        TemplateId::DesignReview => {
            "You are a senior technical architect reviewing functional and technical \
             design documents.\n\n\
             Design documentation:\n{design_document}\n\n\
             Decide Approved / Not Approved and give feedback on completeness, clarity, \
             and technical feasibility."
        }
        TemplateId::CodeGeneration => {
            "You are a senior software engineer with deep expertise in designing modular, \
             scalable, production-ready systems.\n\n\
             Based solely on the following design documents, independently decide how to \
             split the project into source files and generate full code for each file.\n\n\
             Design Documents:\n{design_document}\n\n\
             Requirements for each file: single clear responsibility, clean \
             production-grade code, all necessary imports, error and edge-case handling, \
             secure against common vulnerabilities, standard naming conventions.\n\n\
             Output format, strictly, for every file:\n\
             Filename: <file_name>\n\
             Code:\n\
             ```\n\
             <full code for this file>\n\
             ```\n\
             Do not add any text outside this format."
        }
        TemplateId::CodeReview => {
            "You are a senior software engineer conducting a code review.\n\n\
             Analyze the following code for quality, readability, performance, and \
             adherence to best practices, then decide Approved / Not Approved with \
             actionable feedback.\n\n{code}"
        }
        TemplateId::CodeFix => {
            "You are an expert senior software engineer responsible for fixing code \
             quality issues.\n\n\
             Original code:\n{code}\n\n\
             Code review feedback:\n{feedback}\n\n\
             Correct the code to address all feedback points: security vulnerabilities, \
             logic errors, performance issues, and code smells. Keep imports, functions, \
             and structure complete and functional.\n\n\
             Output format, strictly, for every file:\n\
             Filename: <file_name>\n\
             Code:\n\
             ```\n\
             <full code for this file>\n\
             ```\n\
             Do not add any text outside this format."
        }
        TemplateId::SecurityReview => {
            "You are a senior cybersecurity expert specializing in secure coding \
             practices and vulnerability assessment.\n\n\
             Conduct a thorough security review of the following code:\n\n{code}\n\n\
             Decide Approved / Not Approved and explain detected risks with recommended \
             changes."
        }
        TemplateId::SecurityFix => {
            "You are a cybersecurity expert and software engineer fixing security \
             vulnerabilities.\n\n\
             Original code:\n{code}\n\n\
             Security review feedback:\n{feedback}\n\n\
             Fix all security issues. Return only the corrected code, no explanations.\n\n\
             Output format, strictly, for every file:\n\
             Filename: <file_name>\n\
             Code:\n\
             ```\n\
             <full code for this file>\n\
             ```"
        }
        TemplateId::TestGeneration => {
            "You are a senior QA engineer with expertise in comprehensive test coverage \
             and test-driven development.\n\n\
             Create a test suite for the following code and design specifications:\n\n\
             Code:\n{code}\n\n\
             Functional design:\n{functional_design}\n\n\
             Technical design:\n{technical_design}\n\n\
             Produce a structured list of unit tests, integration tests, and edge cases. \
             Each case: name, description, test steps, expected result."
        }
        TemplateId::TestReview => {
            "You are a senior test strategy expert reviewing the following test cases:\n\n\
             {test_cases}\n\n\
             Decide Approved / Not Approved and explain the improvements needed."
        }
        TemplateId::TestFix => {
            "You are a test case review expert fixing test cases.\n\n\
             Original test cases:\n{test_cases}\n\n\
             Review feedback:\n{feedback}\n\n\
             Fix all issues. Return only the corrected test cases, no explanations."
        }
        TemplateId::QaEvaluation => {
            "You are a seasoned QA engineer with expertise in thorough testing and \
             quality validation.\n\n\
             Perform a QA evaluation of the following code against its test cases.\n\n\
             Code:\n{code}\n\n\
             Test cases:\n{test_cases}\n\n\
             Decide Approved / Not Approved and include test case execution results in \
             the feedback."
        }
        TemplateId::QaFix => {
            "You are an expert software engineer fixing code based on QA feedback.\n\n\
             Original code:\n{code}\n\n\
             Test cases:\n{test_cases}\n\n\
             QA feedback:\n{feedback}\n\n\
             Design documents:\n{design_document}\n\n\
             Fix the code to address all issues, keeping it consistent with the design \
             documents.\n\n\
             Output format, strictly, for every file:\n\
             Filename: <file_name>\n\
             Code:\n\
             ```\n\
             <full code for this file>\n\
             ```"
        }
    }
}

fn schema_instruction(kind: PayloadKind) -> &'static str {
    match kind {
        PayloadKind::Stories => {
            "\n\nRespond with a JSON object: {\"stories\": [\"...\", ...]}."
        }
        PayloadKind::Verdict => {
            "\n\nRespond with a JSON object: {\"status\": \"Approved\" or \"Not Approved\", \
             \"review\": \"detailed point-wise feedback\"}."
        }
        PayloadKind::Design => {
            "\n\nRespond with a JSON object: {\"functional\": [\"...\", ...], \
             \"technical\": [\"...\", ...]}."
        }
        PayloadKind::Code => {
            "\n\nRespond with a JSON object: {\"generated_code\": \"<all file blocks in the \
             format above>\"}."
        }
        PayloadKind::Cases => {
            "\n\nRespond with a JSON object: {\"cases\": [\"...\", ...]}."
        }
    }
}

/// Render the full prompt for a request: template body with every
/// `{variable}` substituted, plus the JSON shape instruction.
pub fn render(request: &ContentRequest) -> String {
    let mut prompt = body(request.template).to_string();
    for (key, value) in &request.variables {
        prompt = prompt.replace(&format!("{{{}}}", key), value);
    }
    prompt.push_str(schema_instruction(request.template.payload_kind()));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use devflow_core::content::ContentRequest;

    #[test]
    fn test_render_substitutes_variables() {
        let request = ContentRequest::new(TemplateId::StoryGeneration)
            .var("requirements", "Build a to-do list app");
        let prompt = render(&request);
        assert!(prompt.contains("\"Build a to-do list app\""));
        assert!(!prompt.contains("{requirements}"));
    }

    #[test]
    fn test_render_appends_shape_instruction() {
        let request = ContentRequest::new(TemplateId::CodeReview).var("code", "print('hi')");
        let prompt = render(&request);
        assert!(prompt.contains("\"Not Approved\""));
        assert!(prompt.trim_end().ends_with('.'));
    }

    #[test]
    fn test_every_template_has_a_body() {
        use TemplateId::*;
        for template in [
            StoryGeneration,
            StoryRevision,
            StoryReview,
            DesignGeneration,
            DesignRevision,
            DesignReview,
            CodeGeneration,
            CodeReview,
            CodeFix,
            SecurityReview,
            SecurityFix,
            TestGeneration,
            TestReview,
            TestFix,
            QaEvaluation,
            QaFix,
        ] {
            assert!(!body(template).is_empty());
        }
    }
}
