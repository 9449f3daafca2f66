use anyhow::Result;

use crate::client::ApiClient;
use crate::output;

pub async fn images(client: &ApiClient) -> Result<()> {
    let images = client.images().await?;
    println!("{}", output::images_table(&images));
    Ok(())
}
