use std::sync::LazyLock;

use async_trait::async_trait;
use myrasec_api::{ListParams, MyrasecApi, WaitingRoom};

use crate::content_hash::{CONTENT, set_content, with_content_fields};
use crate::error::ProviderResult;
use crate::lookup::{domain_id_for_subdomain, fetch_by_id, resolve_subdomain};
use crate::names::{canonical_name, is_general_domain};
use crate::schema::{ResourceSchema, Schema};
use crate::state::ResourceData;
use crate::throttle::waiting_room_guard;
use crate::translate::{parse_time, set_timestamps, set_vendor_id};

use super::{ResourceHandler, existing_id, import_scoped, required_str, subdomain_name_schema};

pub(crate) static SCHEMA: LazyLock<ResourceSchema> = LazyLock::new(|| {
    with_content_fields(
        ResourceSchema::new()
            .field("subdomain_name", subdomain_name_schema())
            .field("waiting_room_id", Schema::int().computed())
            .field("vhost_id", Schema::int().computed())
            .field("name", Schema::string().required())
            .field(
                "paths",
                Schema::string_set()
                    .required()
                    .describe("Request paths routed through the waiting room."),
            )
            .field("max_concurrent", Schema::int().required().int_range(1, i64::MAX))
            .field("session_timeout", Schema::int().optional().default(300))
            .field("wait_refresh", Schema::int().optional().default(30))
            .field("created", Schema::string().computed())
            .field("modified", Schema::string().computed()),
    )
});

fn build(d: &ResourceData) -> ProviderResult<WaitingRoom> {
    Ok(WaitingRoom {
        id: existing_id(d)?,
        vhost_id: d.get_i64("vhost_id"),
        sub_domain_name: d.get_string("subdomain_name"),
        name: required_str(d, "name")?,
        content: d.get_str(CONTENT).unwrap_or_default().to_string(),
        paths: d.get_string_set("paths"),
        max_concurrent: d.get_i64("max_concurrent"),
        session_timeout: d.get_i64("session_timeout"),
        wait_refresh: d.get_i64("wait_refresh"),
        modified: parse_time(d, "modified")?,
        ..WaitingRoom::default()
    })
}

pub(crate) fn set(d: &mut ResourceData, w: &WaitingRoom) {
    set_vendor_id(d, "waiting_room_id", w.id);
    d.set_opt("vhost_id", w.vhost_id);
    if let Some(name) = &w.sub_domain_name {
        d.set("subdomain_name", canonical_name(name));
    }
    d.set("name", w.name.clone());
    set_content(d, &w.content);
    let mut paths = w.paths.clone();
    paths.sort();
    paths.dedup();
    d.set("paths", paths);
    d.set_opt("max_concurrent", w.max_concurrent);
    d.set_opt("session_timeout", w.session_timeout);
    d.set_opt("wait_refresh", w.wait_refresh);
    set_timestamps(d, w.created.as_ref(), w.modified.as_ref());
}

/// Domain id plus vhost id of the room's subdomain.
async fn scope(api: &dyn MyrasecApi, d: &ResourceData) -> ProviderResult<(i64, Option<i64>)> {
    let name = required_str(d, "subdomain_name")?;
    if is_general_domain(&name) {
        return Ok((domain_id_for_subdomain(api, &name).await?, None));
    }
    let vhost = resolve_subdomain(api, &name).await?;
    let domain_id = match vhost.domain_id {
        Some(id) => id,
        None => domain_id_for_subdomain(api, &name).await?,
    };
    Ok((domain_id, vhost.id))
}

pub struct WaitingRoomResource;

#[async_trait]
impl ResourceHandler for WaitingRoomResource {
    fn name(&self) -> &'static str {
        "myrasec_waiting_room"
    }

    fn schema(&self) -> &'static ResourceSchema {
        &SCHEMA
    }

    async fn create(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (domain_id, vhost_id) = scope(api, d).await?;
        let mut room = build(d)?;
        room.vhost_id = vhost_id;
        let _guard = waiting_room_guard().await;
        log::debug!("[waiting_room] create {} (vhost {vhost_id:?})", room.name);
        let created = api.create_waiting_room(domain_id, &room).await?;
        set(d, &created);
        Ok(())
    }

    async fn read(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (domain_id, _) = scope(api, d).await?;
        let id = d.id_i64()?;
        let room = fetch_by_id(
            ListParams::default(),
            |p| async move { api.list_waiting_rooms(domain_id, &p).await },
            id,
            "waiting room",
        )
        .await?;
        set(d, &room);
        Ok(())
    }

    async fn update(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (domain_id, vhost_id) = scope(api, d).await?;
        let mut room = build(d)?;
        room.vhost_id = room.vhost_id.or(vhost_id);
        let _guard = waiting_room_guard().await;
        let updated = api.update_waiting_room(domain_id, &room).await?;
        set(d, &updated);
        Ok(())
    }

    async fn delete(&self, api: &dyn MyrasecApi, d: &mut ResourceData) -> ProviderResult<()> {
        let (domain_id, _) = scope(api, d).await?;
        let room = build(d)?;
        api.delete_waiting_room(domain_id, &room).await?;
        Ok(())
    }

    async fn import(&self, api: &dyn MyrasecApi, id: &str) -> ProviderResult<ResourceData> {
        import_scoped(self, api, id, "subdomain_name").await
    }
}
