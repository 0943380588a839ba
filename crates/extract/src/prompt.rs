pub fn build_entity_prompt(document_text: &str) -> String {
    format!(
        r#"You are an AI assistant that extracts key entities from text.
Extract the names of organizations, people, locations, dates, and contact information from the following text:
{}

Return the results as a JSON array of objects with the fields: "text", "category", and "confidence_score"."#,
        document_text
    )
}
