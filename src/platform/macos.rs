//! Live backend over the macOS Accessibility API and NSWorkspace.
//!
//! Elements are retained `AXUIElementRef`s wrapped in `CFType`; equality is
//! `CFEqual`, which is how the platform identifies the same element across
//! separate copies.

use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_char;
use std::ptr;

use accessibility_sys::{
    AXIsProcessTrusted, AXIsProcessTrustedWithOptions, AXUIElementCopyAttributeValue,
    AXUIElementCreateApplication, AXUIElementGetPid, AXUIElementGetTypeID,
    AXUIElementIsAttributeSettable, AXUIElementRef, AXUIElementSetAttributeValue, kAXErrorSuccess,
    kAXTrustedCheckOptionPrompt,
};
use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_foundation_sys::array::{CFArrayGetCount, CFArrayGetTypeID, CFArrayGetValueAtIndex, CFArrayRef};
use core_foundation_sys::base::{Boolean, CFEqual, CFGetTypeID, CFTypeRef};
use core_foundation_sys::number::CFNumberRef;
use core_foundation_sys::string::CFStringRef;
use objc::runtime::{BOOL, NO, Object};
use objc::{class, msg_send, sel, sel_impl};

use crate::ax::attribute::{AttrValue, ProcessId};
use crate::ax::probe::AttributeProbe;
use crate::platform::process::{ActivationPolicy, PermissionOracle, ProcessRegistry, RunningProcess};

/// A retained accessibility element.
#[derive(Clone)]
pub struct AxElement(CFType);

impl AxElement {
    fn as_ax(&self) -> AXUIElementRef {
        self.0.as_CFTypeRef() as AXUIElementRef
    }
}

impl PartialEq for AxElement {
    fn eq(&self, other: &Self) -> bool {
        unsafe { CFEqual(self.0.as_CFTypeRef(), other.0.as_CFTypeRef()) != 0 }
    }
}

impl fmt::Debug for AxElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AxElement({:p})", self.0.as_CFTypeRef())
    }
}

#[derive(Debug, Default)]
pub struct MacDesktop;

impl MacDesktop {
    pub fn new() -> Self {
        Self
    }
}

impl AttributeProbe for MacDesktop {
    type Element = AxElement;

    fn application(&self, pid: ProcessId) -> Option<AxElement> {
        let raw = unsafe { AXUIElementCreateApplication(pid) };
        if raw.is_null() {
            return None;
        }
        Some(AxElement(unsafe { CFType::wrap_under_create_rule(raw as CFTypeRef) }))
    }

    fn copy_attribute(&self, element: &AxElement, key: &str) -> Option<AttrValue<AxElement>> {
        let name = CFString::new(key);
        let mut value: CFTypeRef = ptr::null();
        let err = unsafe { AXUIElementCopyAttributeValue(element.as_ax(), name.as_concrete_TypeRef(), &mut value) };
        if err != kAXErrorSuccess || value.is_null() {
            return None;
        }
        decode(unsafe { CFType::wrap_under_create_rule(value) })
    }

    fn is_settable(&self, element: &AxElement, key: &str) -> bool {
        let name = CFString::new(key);
        let mut settable: Boolean = 0;
        let err = unsafe { AXUIElementIsAttributeSettable(element.as_ax(), name.as_concrete_TypeRef(), &mut settable) };
        err == kAXErrorSuccess && settable != 0
    }

    fn write_bool(&self, element: &AxElement, key: &str, value: bool) -> bool {
        let name = CFString::new(key);
        let flag = if value { CFBoolean::true_value() } else { CFBoolean::false_value() };
        let err = unsafe { AXUIElementSetAttributeValue(element.as_ax(), name.as_concrete_TypeRef(), flag.as_CFTypeRef()) };
        if err != kAXErrorSuccess {
            log::debug!("AXUIElementSetAttributeValue({}) failed with {}", key, err);
        }
        err == kAXErrorSuccess
    }

    fn owning_process(&self, element: &AxElement) -> ProcessId {
        let mut pid = 0;
        let err = unsafe { AXUIElementGetPid(element.as_ax(), &mut pid) };
        if err == kAXErrorSuccess { pid } else { 0 }
    }
}

fn decode(value: CFType) -> Option<AttrValue<AxElement>> {
    let type_id = value.type_of();
    let raw = value.as_CFTypeRef();

    if type_id == CFString::type_id() {
        let s = unsafe { CFString::wrap_under_get_rule(raw as CFStringRef) };
        return Some(AttrValue::Text(s.to_string()));
    }
    if type_id == CFBoolean::type_id() {
        return Some(AttrValue::Bool(raw == CFBoolean::true_value().as_CFTypeRef()));
    }
    if type_id == CFNumber::type_id() {
        let n = unsafe { CFNumber::wrap_under_get_rule(raw as CFNumberRef) };
        return n.to_f64().map(AttrValue::Number);
    }
    if type_id == unsafe { AXUIElementGetTypeID() } {
        return Some(AttrValue::Element(AxElement(value)));
    }
    if type_id == unsafe { CFArrayGetTypeID() } {
        let array = raw as CFArrayRef;
        let element_type = unsafe { AXUIElementGetTypeID() };
        let count = unsafe { CFArrayGetCount(array) };
        let mut elements = Vec::with_capacity(count.max(0) as usize);
        for i in 0..count {
            let item = unsafe { CFArrayGetValueAtIndex(array, i) };
            if !item.is_null() && unsafe { CFGetTypeID(item) } == element_type {
                elements.push(AxElement(unsafe { CFType::wrap_under_get_rule(item) }));
            }
        }
        return Some(AttrValue::Elements(elements));
    }

    None
}

impl PermissionOracle for MacDesktop {
    fn permission_granted(&self) -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    fn request_permission_prompt(&self) {
        let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
        let options = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
        let _ = unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) };
    }
}

impl ProcessRegistry for MacDesktop {
    fn running_processes(&self) -> Vec<RunningProcess> {
        let mut processes = Vec::new();

        unsafe {
            let workspace: *mut Object = msg_send![class!(NSWorkspace), sharedWorkspace];
            if workspace.is_null() {
                log::warn!("NSWorkspace unavailable");
                return processes;
            }

            let running: *mut Object = msg_send![workspace, runningApplications];
            if running.is_null() {
                return processes;
            }

            let count: usize = msg_send![running, count];
            for i in 0..count {
                let app: *mut Object = msg_send![running, objectAtIndex: i];
                if app.is_null() {
                    continue;
                }

                let pid: i32 = msg_send![app, processIdentifier];
                let bundle_id: *mut Object = msg_send![app, bundleIdentifier];
                let name: *mut Object = msg_send![app, localizedName];
                let policy: isize = msg_send![app, activationPolicy];

                processes.push(RunningProcess {
                    pid,
                    bundle_id: ns_string(bundle_id),
                    name: ns_string(name),
                    activation_policy: match policy {
                        0 => ActivationPolicy::Regular,
                        1 => ActivationPolicy::Accessory,
                        _ => ActivationPolicy::Prohibited,
                    },
                    ui_element_only: declares_ui_element(app),
                });
            }
        }

        processes
    }

    fn current_pid(&self) -> ProcessId {
        std::process::id() as ProcessId
    }
}

unsafe fn ns_string(obj: *mut Object) -> Option<String> {
    if obj.is_null() {
        return None;
    }
    let c_str: *const c_char = unsafe { msg_send![obj, UTF8String] };
    if c_str.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(c_str) }.to_string_lossy().into_owned())
}

/// `LSUIElement` from the application's Info.plist.
unsafe fn declares_ui_element(app: *mut Object) -> bool {
    unsafe {
        let url: *mut Object = msg_send![app, bundleURL];
        if url.is_null() {
            return false;
        }
        let bundle: *mut Object = msg_send![class!(NSBundle), bundleWithURL: url];
        if bundle.is_null() {
            return false;
        }
        let key: *mut Object = msg_send![class!(NSString), stringWithUTF8String: c"LSUIElement".as_ptr()];
        let value: *mut Object = msg_send![bundle, objectForInfoDictionaryKey: key];
        if value.is_null() {
            return false;
        }
        let responds: BOOL = msg_send![value, respondsToSelector: sel!(boolValue)];
        if responds == NO {
            return false;
        }
        let flag: BOOL = msg_send![value, boolValue];
        flag != NO
    }
}
