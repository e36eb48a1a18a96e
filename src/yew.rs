// src/yew.rs
// feature = "yew"

use std::cell::RefCell;

use yew::{function_component, html, use_effect_with, use_mut_ref, Callback, Html, Properties};

use crate::{
    config::PadConfig,
    signature_core::PadEvent,
    ui_common::{MountOptions, MountPoints, MountedPad}
};

/// Visual customization for the signature canvas area.
#[derive(Clone, PartialEq)]
pub struct SignatureStyle {
    /// Container border CSS, e.g. "2px dashed #2b8a3e"
    pub border:     String,
    /// Container background CSS color, e.g. "#fff"
    pub background: String,
    /// Fixed logical height of the drawing area in CSS pixels
    pub height:     f64
}

impl Default for SignatureStyle {
    fn default() -> Self {
        Self {
            border:     "2px dashed #888".into(),
            background: "#fff".into(),
            height:     200.0
        }
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct SignatureProps {
    /// Prefix for the element ids the pad binds to.
    #[prop_or_else(default_prefix)]
    pub id_prefix: String,

    /// Whether the pad's container is currently shown.
    #[prop_or(true)]
    pub visible: bool,

    #[prop_or_default]
    pub style: Option<SignatureStyle>,

    #[prop_or_default]
    pub config: Option<PadConfig>,

    /// Called with the PNG data URL when the user saves a signature.
    #[prop_or_default]
    pub on_signed: Option<Callback<String>>
}

fn default_prefix() -> String {
    "signature".to_string()
}

/// An explicit `config` wins; otherwise the style's height is used.
fn pad_config(props: &SignatureProps, style: &SignatureStyle) -> PadConfig {
    props
        .config
        .clone()
        .unwrap_or_else(|| PadConfig::default().with_logical_height(style.height))
}

/// Forward a save to whatever `on_signed` the latest render supplied.
fn forward_signed(slot: &RefCell<Option<Callback<String>>>, event: &PadEvent) {
    if let PadEvent::Saved { data_url } = event {
        if let Some(cb) = slot.borrow().as_ref() {
            cb.emit(data_url.clone());
        }
    }
}

#[function_component(SignaturePadYew)]
pub fn signature_pad_yew(props: &SignatureProps) -> Html {
    let handle = use_mut_ref(|| None::<MountedPad>);
    let on_signed = use_mut_ref(|| None::<Callback<String>>);
    *on_signed.borrow_mut() = props.on_signed.clone();
    let style = props.style.clone().unwrap_or_default();
    let ids = MountPoints::with_prefix(&props.id_prefix);

    // Mount after the markup is in the DOM; remount if the ids change.
    {
        let handle = handle.clone();
        let on_signed = on_signed.clone();
        let options = MountOptions {
            config:  pad_config(props, &style),
            visible: props.visible
        };
        use_effect_with(ids.clone(), move |ids| {
            match MountedPad::mount(ids, options) {
                Ok(pad) => {
                    pad.on_event(move |event: &PadEvent| forward_signed(&on_signed, event));
                    *handle.borrow_mut() = Some(pad);
                }
                Err(e) => log::warn!("signature pad mount failed: {e}")
            }
            move || {
                handle.borrow_mut().take();
            }
        });
    }

    {
        let handle = handle.clone();
        use_effect_with(props.visible, move |visible| {
            if let Some(pad) = handle.borrow().as_ref() {
                if let Err(e) = pad.set_visible(*visible) {
                    log::warn!("signature pad refresh failed: {e}");
                }
            }
            || ()
        });
    }

    html! {
        <>
          <div id={ids.container_id.clone()}
               class="signature-pad"
               style={format!("border:{};background:{};", style.border, style.background)}>
            <canvas id={ids.canvas_id.clone()} />
          </div>
          <div class="controls">
            <button id={ids.clear_button_id.clone()} type="button">{"Clear"}</button>
            <button id={ids.save_button_id.clone()} type="button">{"Save"}</button>
          </div>
          <div id={ids.preview_id.clone()} class="signature-preview"></div>
        </>
    }
}
