//! Prompt enrichment and the instruction template

use crate::response::Region;

/// Prompts shorter than this get a generic design request appended
const SHORT_PROMPT_CHARS: usize = 20;

/// Section hints keyed by site type; the first matching entry wins
const SECTION_HINTS: [(&[&str], &str); 4] = [
    (
        &["portfolio"],
        " Include sections for projects, skills, about me, and contact information.",
    ),
    (
        &["ecommerce", "shop"],
        " Include product listing, shopping cart preview, hero section with promotions, and product categories.",
    ),
    (
        &["blog"],
        " Include featured posts, categories, article previews with images, and a newsletter signup.",
    ),
    (
        &["landing"],
        " Include a compelling hero section, features or benefits section, testimonials, and a strong call-to-action.",
    ),
];

/// Expand a raw prompt with keyword-triggered section hints plus default
/// responsiveness and colour requests. Matching ignores case.
pub fn enhance_prompt(prompt: &str) -> String {
    let mut enhanced = prompt.trim().to_string();

    if enhanced.chars().count() < SHORT_PROMPT_CHARS {
        enhanced.push_str(" with a clean, modern design that follows current web design trends");
    }

    let lowered = enhanced.to_lowercase();
    if let Some((_, hint)) = SECTION_HINTS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
    {
        enhanced.push_str(hint);
    }

    if !lowered.contains("responsive") {
        enhanced.push_str(
            " The design should be fully responsive and work well on mobile, tablet, and desktop.",
        );
    }
    if !lowered.contains("color") && !lowered.contains("theme") {
        enhanced.push_str(" Use a professional color scheme with good contrast.");
    }

    enhanced
}

/// The full instruction sent upstream for an already enhanced prompt
pub fn build_instruction(enhanced_prompt: &str) -> String {
    let [html, css, js] = Region::ALL;
    format!(
        r#"You are a professional web developer specializing in modern, responsive websites.

Create a modern, professional-looking website using Tailwind CSS based on the following description: "{prompt}".

Your response must include:

1. HTML code that implements a responsive layout with Tailwind CSS classes directly in the HTML
2. Any custom CSS that might be needed (minimize this as much as possible by leveraging Tailwind)
3. JavaScript for interactivity if needed

Important formatting requirements:
- ALL text content (headings, paragraphs, button text, etc.) should have a data-editable="true" attribute
- ALL images should have a data-editable="image" attribute and use placeholder images from https://placehold.co/ or similar services
- Make sure all editable elements have unique IDs for reference

General requirements:
- Create a visually appealing, modern design that follows current web design trends
- Use semantic HTML5 elements
- Make the design fully responsive for mobile, tablet, and desktop
- Include proper spacing, typography, and visual hierarchy
- Add appropriate micro-interactions and hover states
- Ensure good accessibility practices
- Include a proper header, hero section, and footer

Format your response with these exact delimiters:
{html_start}
[Your HTML code here with Tailwind classes]
{html_end}

{css_start}
[Any additional custom CSS needed, minimize this]
{css_end}

{js_start}
[Your JavaScript code here]
{js_end}

Remember to use Tailwind CSS classes directly in the HTML elements rather than writing custom CSS."#,
        prompt = enhanced_prompt,
        html_start = html.start(),
        html_end = html.end(),
        css_start = css.start(),
        css_end = css.end(),
        js_start = js.start(),
        js_end = js.end(),
    )
}
