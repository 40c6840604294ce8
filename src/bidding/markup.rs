// src/bidding/markup.rs

use crate::error::{AssetKind, BidError};
use crate::openrtb::native::{NativeMarkup, NativeReqAsset, NativeRequest};
use crate::openrtb::request::BidRequest;
use crate::openrtb::response::Bid;

/// 为原生广告 bid 的 markup 补全 asset 描述类型。
/// bidder 下发的 markup 里 img.type / data.type 往往缺失，
/// 这里从请求侧同 ID 的 asset 把类型抄回来。
///
/// 返回 (补全后的 markup, 非致命错误)。markup 为 None 时调用方
/// 保留原始 adm 不动：部分 bidder 下发非 IAB 规范的 markup
/// （无法解析或没有 assets），这种情况静默跳过。
pub fn add_native_types(bid: &Bid, request: &BidRequest) -> (Option<NativeMarkup>, Vec<BidError>) {
    let mut errs = Vec::new();

    let adm = bid.adm.as_deref().unwrap_or("");
    let mut markup: NativeMarkup = match serde_json::from_str(adm) {
        Ok(markup) => markup,
        Err(_) => return (None, errs),
    };
    if markup.assets.is_empty() {
        return (None, errs);
    }

    let Some(native_imp) = native_imp_by_imp_id(&bid.impid, request) else {
        errs.push(BidError::NativeImpNotFound);
        return (None, errs);
    };

    // 请求负载解析失败时记录错误但继续：此时按空 asset 列表处理，
    // 响应里的每个 img/data asset 都会报 ID 不存在
    let payload: NativeRequest = match serde_json::from_str(&native_imp.request) {
        Ok(payload) => payload,
        Err(e) => {
            errs.push(BidError::Json(e));
            NativeRequest::default()
        }
    };

    // 整体替换 asset 列表，而不是在遍历中原地修改
    let mut enriched = Vec::with_capacity(markup.assets.len());
    for asset in &markup.assets {
        let mut updated = asset.clone();
        if let Err(e) = set_asset_types(&mut updated, &payload.assets) {
            errs.push(e);
        }
        enriched.push(updated);
    }
    markup.assets = enriched;

    (Some(markup), errs)
}

/// 把请求侧 asset 的 img.type / data.type 抄到响应侧 asset 上。
/// img 分支先于 data 分支；img 分支已生效的修改不因 data 分支出错而回退。
fn set_asset_types(
    asset: &mut crate::openrtb::native::NativeMarkupAsset,
    req_assets: &[NativeReqAsset],
) -> Result<(), BidError> {
    if let Some(img) = asset.img.as_mut() {
        let req_asset = asset_by_id(asset.id, req_assets)?;
        match &req_asset.img {
            Some(req_img) => {
                if req_img.asset_type.unwrap_or(0) != 0 {
                    img.asset_type = req_img.asset_type;
                }
            }
            None => {
                return Err(BidError::AssetMismatch {
                    kind: AssetKind::Image,
                    id: asset.id,
                })
            }
        }
    }

    if let Some(data) = asset.data.as_mut() {
        let req_asset = asset_by_id(asset.id, req_assets)?;
        match &req_asset.data {
            Some(req_data) => {
                if req_data.asset_type.unwrap_or(0) != 0 {
                    data.asset_type = req_data.asset_type;
                }
            }
            None => {
                return Err(BidError::AssetMismatch {
                    kind: AssetKind::Data,
                    id: asset.id,
                })
            }
        }
    }

    Ok(())
}

fn native_imp_by_imp_id<'a>(
    imp_id: &str,
    request: &'a BidRequest,
) -> Option<&'a crate::openrtb::request::Native> {
    request
        .imp
        .iter()
        .find(|imp| imp.id == imp_id && imp.native.is_some())
        .and_then(|imp| imp.native.as_ref())
}

fn asset_by_id(id: i64, assets: &[NativeReqAsset]) -> Result<&NativeReqAsset, BidError> {
    assets
        .iter()
        .find(|asset| asset.id == id)
        .ok_or(BidError::MissingAsset(id))
}
