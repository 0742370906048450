//! Prompt templates and assembly.
//!
//! Every generation batch uses one base template, chosen by whether a person
//! photo was supplied, followed by one of three fixed shot variations.

/// Base template used when the user supplied a person photo.
pub const BASE_PROMPT_WITH_PERSON: &str = r#"
You are an AI that generates realistic UGC (User Generated Content) lifestyle photos.
Use the person’s facial features, hairstyle, and skin tone from the provided person image.
Generate a realistic photo where this person is naturally interacting with the food item from the provided food image.
Keep lighting, pose, and environment casual and natural — like a smartphone photo or social media post.
The person should look happy, authentic, and genuinely engaged with the food.

General Style Guidelines:
- Use lifestyle lighting (soft, natural light).
- Add slight imperfections for realism (soft blur, handheld framing).
- Keep proportions and skin tones natural.
- Output a photo that looks like authentic user-generated content, not an advertisement.
"#;

/// Base template used when only a food photo was supplied.
pub const BASE_PROMPT_WITHOUT_PERSON: &str = r#"
You are an AI that generates realistic UGC (User Generated Content) lifestyle photos.
Generate a realistic UGC-style image with a random natural-looking person (not a professional model). The model must be the same person in all images: a woman in her early 20s with a friendly smile and brown hair, wearing a simple, stylish casual outfit (like a neutral-colored sweater or t-shirt).
The person should appear to be enjoying or interacting with the food from the provided food image.
Make the setting look relatable — like a cafe, kitchen, picnic, or restaurant. The mood should feel warm, friendly, and real.
The model's face must be clearly visible and they should have a natural, engaging expression.
The setting should be a bright, modern, and aesthetically pleasing environment like a trendy cafe or a stylish home kitchen with soft, natural lighting.
The food from the user's image should be the hero of the shot, presented beautifully. The overall vibe must feel authentic and relatable, like a genuine post from a food influencer.

General Style Guidelines:
- Use lifestyle lighting (soft, natural light).
- Add slight imperfections for realism (soft blur, handheld framing).
- Keep proportions and skin tones natural.
- Output a photo that looks like authentic user-generated content, not an advertisement.
"#;

/// The three shot variations appended to the base template.
pub const PROMPT_VARIATIONS: [&str; 3] = [
    "In this shot, the person is happily presenting the dish towards the camera with both hands, smiling warmly as if she's about to share it.",
    "In this shot, the person is captured mid-action, taking a joyful, delicious bite of the dish. Her eyes can be closed in enjoyment.",
    "This is a candid lifestyle shot. The person is interacting naturally with the dish off to the side, perhaps laughing or looking at it with delight, not looking directly at the camera. The focus is on a genuine moment of enjoyment.",
];

/// Number of prompts (and therefore generation calls) per batch.
pub const SHOTS_PER_BATCH: usize = PROMPT_VARIATIONS.len();

/// Returns the base template for the given session type.
pub fn base_prompt(person_present: bool) -> &'static str {
    if person_present {
        BASE_PROMPT_WITH_PERSON
    } else {
        BASE_PROMPT_WITHOUT_PERSON
    }
}

/// Builds the full prompt for each variation: `base + "\n" + variation`.
pub fn assemble_prompts(person_present: bool) -> [String; SHOTS_PER_BATCH] {
    let base = base_prompt(person_present);
    PROMPT_VARIATIONS.map(|variation| format!("{}\n{}", base, variation))
}
