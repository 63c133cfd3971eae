//! Public image handler (Cloudit server templates)

use super::ClouditContext;
use crate::model::{RawTemplate, TEMPLATE_KEY_VALUES, key_values};
use async_trait::async_trait;
use cloudweave_cloud::{CloudError, Iid, ImageHandler, ImageInfo, ImageStatus, Result};

pub struct ClouditImageHandler {
    ctx: ClouditContext,
}

impl ClouditImageHandler {
    pub fn new(ctx: ClouditContext) -> Self {
        Self { ctx }
    }
}

pub(crate) fn to_image_info(template: &RawTemplate) -> ImageInfo {
    let status = if template.state.eq_ignore_ascii_case("available") {
        ImageStatus::Available
    } else {
        ImageStatus::Unavailable
    };
    ImageInfo {
        iid: Iid::new(&template.name, &template.id),
        guest_os: template.os.clone(),
        status,
        key_value_list: key_values(template, TEMPLATE_KEY_VALUES),
    }
}

pub(crate) async fn find_template(ctx: &ClouditContext, iid: &Iid) -> Result<RawTemplate> {
    iid.require_valid("Image")?;
    ctx.api
        .list_templates()
        .await?
        .into_iter()
        .find(|t| iid.matches(&t.name, &t.id))
        .ok_or_else(|| CloudError::NotFound(format!("image '{}'", iid)))
}

#[async_trait]
impl ImageHandler for ClouditImageHandler {
    async fn list_image(&self) -> Result<Vec<ImageInfo>> {
        Ok(self
            .ctx
            .api
            .list_templates()
            .await?
            .iter()
            .map(to_image_info)
            .collect())
    }

    async fn get_image(&self, iid: &Iid) -> Result<ImageInfo> {
        let template = find_template(&self.ctx, iid).await?;
        Ok(to_image_info(&template))
    }
}
