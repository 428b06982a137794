use std::{borrow::Cow, fmt};

use axum::extract::{multipart::MultipartError, Multipart};
use image::ImageFormat;
use sqlx::SqlitePool;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    db_helpers::category_exists,
    errors::RequestError,
    models::{PostChanges, PostStatus},
};

/// Largest accepted featured image.
pub const MAX_IMAGE_KILOBYTES: usize = 2048;

/// A file part of a multipart request, held in memory.
#[derive(Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Detects an image's format from its leading bytes; the client supplied
/// name and content type are not trusted.
pub fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// File extension a stored image of `format` gets.
pub fn image_extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("img")
}

/// Rule set a post form is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostRules {
    Create,
    Update,
}

impl PostRules {
    fn image_formats(self) -> &'static [ImageFormat] {
        match self {
            PostRules::Create => &[ImageFormat::Jpeg, ImageFormat::Png, ImageFormat::WebP],
            PostRules::Update => &[
                ImageFormat::Jpeg,
                ImageFormat::Png,
                ImageFormat::Gif,
                ImageFormat::WebP,
            ],
        }
    }

    fn image_formats_label(self) -> &'static str {
        match self {
            PostRules::Create => "jpg, jpeg, png, webp",
            PostRules::Update => "jpeg, png, jpg, gif, webp",
        }
    }
}

/// Raw post form as submitted. Empty fields are `None`.
#[derive(Debug, Default, Validate)]
pub struct PostForm {
    #[validate(
        required(message = "The title field is required."),
        length(max = 255, message = "The title field must not be greater than 255 characters.")
    )]
    pub title: Option<String>,
    #[validate(length(max = 255, message = "The slug field must not be greater than 255 characters."))]
    pub slug: Option<String>,
    #[validate(required(message = "The post category id field is required."))]
    pub post_category_id: Option<String>,
    #[validate(required(message = "The content field is required."))]
    pub content: Option<String>,
    #[validate(required(message = "The status field is required."))]
    pub status: Option<String>,
    #[validate(length(
        max = 255,
        message = "The meta title field must not be greater than 255 characters."
    ))]
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keyword: Option<String>,
    pub featured_image: Option<UploadedFile>,
}

/// A featured image that passed validation.
#[derive(Debug, Clone)]
pub struct ValidImage {
    pub file: UploadedFile,
    pub format: ImageFormat,
}

/// A post form that passed every rule.
#[derive(Debug, Clone)]
pub struct ValidPost {
    pub changes: PostChanges,
    pub slug: Option<String>,
    pub featured_image: Option<ValidImage>,
}

impl PostForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<PostForm, RequestError> {
        let mut form = PostForm::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or("").to_string();
            if name == "featured_image" {
                form.featured_image = read_file(field).await?;
                continue;
            }
            let value = field.text().await.map_err(bad_multipart)?;
            let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            match name.as_str() {
                "title" => form.title = value,
                "slug" => form.slug = value,
                "post_category_id" => form.post_category_id = value,
                "content" => form.content = value,
                "status" => form.status = value,
                "meta_title" => form.meta_title = value,
                "meta_description" => form.meta_description = value,
                "meta_keyword" => form.meta_keyword = value,
                _ => {}
            }
        }

        Ok(form)
    }

    /// Checks every rule and reports all failing fields at once.
    pub async fn validate_for(
        self,
        pool: &SqlitePool,
        rules: PostRules,
    ) -> Result<ValidPost, RequestError> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if rules == PostRules::Create {
            if exceeds(&self.meta_description, 500) {
                errors.add(
                    "meta_description",
                    rule_error(
                        "length",
                        "The meta description field must not be greater than 500 characters.",
                    ),
                );
            }
            if exceeds(&self.meta_keyword, 255) {
                errors.add(
                    "meta_keyword",
                    rule_error(
                        "length",
                        "The meta keyword field must not be greater than 255 characters.",
                    ),
                );
            }
        }

        let status = match self.status.as_deref() {
            Some(raw) => {
                let status = PostStatus::parse(raw);
                if status.is_none() {
                    errors.add("status", rule_error("in", "The selected status is invalid."));
                }
                status
            }
            None => None,
        };

        let post_category_id = match self.post_category_id.as_deref() {
            Some(raw) => {
                let known = match raw.parse::<i64>() {
                    Ok(id) => category_exists(pool, id).await?.then_some(id),
                    Err(_) => None,
                };
                if known.is_none() {
                    errors.add(
                        "post_category_id",
                        rule_error("exists", "The selected post category id is invalid."),
                    );
                }
                known
            }
            None => None,
        };

        let featured_image = match self.featured_image {
            Some(file) => match check_image(&file, rules) {
                Ok(format) => Some(ValidImage { file, format }),
                Err(error) => {
                    errors.add("featured_image", error);
                    None
                }
            },
            None => None,
        };

        match (self.title, self.content, status, post_category_id) {
            (Some(title), Some(content), Some(status), Some(post_category_id))
                if errors.is_empty() =>
            {
                Ok(ValidPost {
                    changes: PostChanges {
                        title,
                        post_category_id,
                        content,
                        status,
                        meta_title: self.meta_title,
                        meta_description: self.meta_description,
                        meta_keyword: self.meta_keyword,
                    },
                    slug: self.slug,
                    featured_image,
                })
            }
            _ => Err(errors.into()),
        }
    }
}

/// Reads the editor's `upload` file part, skipping every other field.
pub async fn read_editor_upload(mut multipart: Multipart) -> Result<Option<UploadedFile>, RequestError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() == Some("upload") && upload.is_none() {
            upload = read_file(field).await?;
        }
    }
    Ok(upload)
}

async fn read_file(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<UploadedFile>, RequestError> {
    let file_name = field.file_name().unwrap_or("").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(bad_multipart)?;
    // Browsers submit an empty, nameless part when no file was chosen.
    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(UploadedFile {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

fn check_image(file: &UploadedFile, rules: PostRules) -> Result<ImageFormat, ValidationError> {
    let format = sniff_image_format(&file.bytes).ok_or_else(|| {
        rule_error("image", "The featured image field must be an image.")
    })?;
    if !rules.image_formats().contains(&format) {
        return Err(rule_error(
            "mimes",
            format!(
                "The featured image field must be a file of type: {}.",
                rules.image_formats_label()
            ),
        ));
    }
    if file.bytes.len() > MAX_IMAGE_KILOBYTES * 1024 {
        return Err(rule_error(
            "max",
            format!(
                "The featured image field must not be greater than {} kilobytes.",
                MAX_IMAGE_KILOBYTES
            ),
        ));
    }
    Ok(format)
}

fn exceeds(value: &Option<String>, max: usize) -> bool {
    value
        .as_deref()
        .map(|v| v.chars().count() > max)
        .unwrap_or(false)
}

fn rule_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn bad_multipart(error: MultipartError) -> RequestError {
    RequestError::BadRequest(error.to_string())
}
