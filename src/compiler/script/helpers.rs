//! Runtime helpers for downleveled syntax.
//!
//! The transformer is set to external helper mode, so lowered code calls
//! `babelHelpers.asyncToGenerator(...)` and friends instead of importing the
//! npm runtime package. After linking, the helpers a bundle references are
//! defined once at its top:
//!
//! ```text
//! var babelHelpers = (function () {
//!     function _asyncToGenerator(n) { ... }
//!     return { "asyncToGenerator": _asyncToGenerator };
//! })();
//! ```

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Global object the transformer reads helpers from in external mode.
pub const HELPERS_OBJECT: &str = "babelHelpers";

static HELPER_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bbabelHelpers\.([A-Za-z0-9_$]+)").expect("valid pattern"));

struct Helper {
    name: &'static str,
    /// Helpers this one calls.
    deps: &'static [&'static str],
    /// Declares `_<name>`; may add statements after the declaration.
    source: &'static str,
}

const HELPERS: &[Helper] = &[
    Helper {
        name: "toPrimitive",
        deps: &[],
        source: r#"function _toPrimitive(t, r) {
  if (typeof t != "object" || !t) return t;
  var e = t[Symbol.toPrimitive];
  if (e !== void 0) {
    var i = e.call(t, r || "default");
    if (typeof i != "object") return i;
    throw new TypeError("@@toPrimitive must return a primitive value.");
  }
  return (r === "string" ? String : Number)(t);
}"#,
    },
    Helper {
        name: "toPropertyKey",
        deps: &["toPrimitive"],
        source: r#"function _toPropertyKey(t) {
  var i = _toPrimitive(t, "string");
  return typeof i == "symbol" ? i : i + "";
}"#,
    },
    Helper {
        name: "defineProperty",
        deps: &["toPropertyKey"],
        source: r#"function _defineProperty(e, r, t) {
  r = _toPropertyKey(r);
  if (r in e) {
    Object.defineProperty(e, r, { value: t, enumerable: true, configurable: true, writable: true });
  } else {
    e[r] = t;
  }
  return e;
}"#,
    },
    Helper {
        name: "ownKeys",
        deps: &[],
        source: r#"function _ownKeys(e, r) {
  var t = Object.keys(e);
  if (Object.getOwnPropertySymbols) {
    var o = Object.getOwnPropertySymbols(e);
    if (r) o = o.filter(function (s) { return Object.getOwnPropertyDescriptor(e, s).enumerable; });
    t.push.apply(t, o);
  }
  return t;
}"#,
    },
    Helper {
        name: "objectSpread2",
        deps: &["ownKeys", "defineProperty"],
        source: r#"function _objectSpread2(e) {
  for (var r = 1; r < arguments.length; r++) {
    var t = arguments[r] != null ? arguments[r] : {};
    if (r % 2) {
      _ownKeys(Object(t), true).forEach(function (k) { _defineProperty(e, k, t[k]); });
    } else if (Object.getOwnPropertyDescriptors) {
      Object.defineProperties(e, Object.getOwnPropertyDescriptors(t));
    } else {
      _ownKeys(Object(t)).forEach(function (k) {
        Object.defineProperty(e, k, Object.getOwnPropertyDescriptor(t, k));
      });
    }
  }
  return e;
}"#,
    },
    Helper {
        name: "extends",
        deps: &[],
        source: r#"function _extends() {
  return Object.assign.apply(null, arguments);
}"#,
    },
    Helper {
        name: "objectWithoutPropertiesLoose",
        deps: &[],
        source: r#"function _objectWithoutPropertiesLoose(r, e) {
  if (r == null) return {};
  var t = {};
  for (var n in r) {
    if ({}.hasOwnProperty.call(r, n) && e.indexOf(n) === -1) t[n] = r[n];
  }
  return t;
}"#,
    },
    Helper {
        name: "objectWithoutProperties",
        deps: &["objectWithoutPropertiesLoose"],
        source: r#"function _objectWithoutProperties(e, t) {
  if (e == null) return {};
  var i = _objectWithoutPropertiesLoose(e, t);
  if (Object.getOwnPropertySymbols) {
    var s = Object.getOwnPropertySymbols(e);
    for (var r = 0; r < s.length; r++) {
      var o = s[r];
      if (t.indexOf(o) === -1 && {}.propertyIsEnumerable.call(e, o)) i[o] = e[o];
    }
  }
  return i;
}"#,
    },
    Helper {
        name: "objectDestructuringEmpty",
        deps: &[],
        source: r#"function _objectDestructuringEmpty(t) {
  if (t == null) throw new TypeError("Cannot destructure " + t);
}"#,
    },
    Helper {
        name: "asyncToGenerator",
        deps: &[],
        source: r#"function _asyncGeneratorStep(n, t, e, r, o, a, c) {
  try {
    var i = n[a](c), u = i.value;
  } catch (err) {
    e(err);
    return;
  }
  if (i.done) t(u); else Promise.resolve(u).then(r, o);
}
function _asyncToGenerator(n) {
  return function () {
    var t = this, e = arguments;
    return new Promise(function (r, o) {
      var a = n.apply(t, e);
      function _next(v) { _asyncGeneratorStep(a, r, o, _next, _throw, "next", v); }
      function _throw(v) { _asyncGeneratorStep(a, r, o, _next, _throw, "throw", v); }
      _next(void 0);
    });
  };
}"#,
    },
    Helper {
        name: "OverloadYield",
        deps: &[],
        source: r#"function _OverloadYield(e, d) {
  this.v = e;
  this.k = d;
}"#,
    },
    Helper {
        name: "awaitAsyncGenerator",
        deps: &["OverloadYield"],
        source: r#"function _awaitAsyncGenerator(e) {
  return new _OverloadYield(e, 0);
}"#,
    },
    Helper {
        name: "wrapAsyncGenerator",
        deps: &["OverloadYield"],
        source: r#"function _wrapAsyncGenerator(e) {
  return function () { return new _AsyncGenerator(e.apply(this, arguments)); };
}
function _AsyncGenerator(e) {
  var head, tail;
  function resume(key, arg) {
    try {
      var n = e[key](arg), o = n.value, u = o instanceof _OverloadYield;
      Promise.resolve(u ? o.v : o).then(function (t) {
        if (u) {
          var next = key === "return" ? "return" : "next";
          if (!o.k || t.done) return resume(next, t);
          t = e[next](t).value;
        }
        settle(n.done ? "return" : "normal", t);
      }, function (err) { resume("throw", err); });
    } catch (err) {
      settle("throw", err);
    }
  }
  function settle(type, value) {
    if (type === "return") head.resolve({ value: value, done: true });
    else if (type === "throw") head.reject(value);
    else head.resolve({ value: value, done: false });
    head = head.next;
    if (head) resume(head.key, head.arg); else tail = null;
  }
  this._invoke = function (key, arg) {
    return new Promise(function (resolve, reject) {
      var request = { key: key, arg: arg, resolve: resolve, reject: reject, next: null };
      if (tail) {
        tail = tail.next = request;
      } else {
        head = tail = request;
        resume(key, arg);
      }
    });
  };
  if (typeof e.return != "function") this.return = void 0;
}
_AsyncGenerator.prototype[typeof Symbol == "function" && Symbol.asyncIterator || "@@asyncIterator"] = function () { return this; };
_AsyncGenerator.prototype.next = function (v) { return this._invoke("next", v); };
_AsyncGenerator.prototype.throw = function (v) { return this._invoke("throw", v); };
_AsyncGenerator.prototype.return = function (v) { return this._invoke("return", v); };"#,
    },
    Helper {
        name: "asyncIterator",
        deps: &[],
        source: r#"function _asyncIterator(r) {
  var m = typeof Symbol == "function" && Symbol.asyncIterator ? r[Symbol.asyncIterator] : void 0;
  if (m != null) return m.call(r);
  m = r[Symbol.iterator];
  if (m != null) return _asyncFromSyncIterator(m.call(r));
  throw new TypeError("Object is not async iterable");
}
function _asyncFromSyncIterator(s) {
  function settle(step) {
    if (Object(step) !== step) return Promise.reject(new TypeError(step + " is not an object."));
    var done = step.done;
    return Promise.resolve(step.value).then(function (value) { return { value: value, done: done }; });
  }
  return {
    next: function () { return settle(s.next.apply(s, arguments)); },
    return: function (v) {
      var f = s.return;
      return f === void 0 ? Promise.resolve({ value: v, done: true }) : settle(f.apply(s, arguments));
    },
    throw: function (v) {
      var f = s.throw;
      return f === void 0 ? Promise.reject(v) : settle(f.apply(s, arguments));
    }
  };
}"#,
    },
    Helper {
        name: "asyncGeneratorDelegate",
        deps: &["OverloadYield"],
        source: r#"function _asyncGeneratorDelegate(t) {
  var e = {}, waiting = false;
  function pump(key, value) {
    waiting = true;
    value = new Promise(function (resolve) { resolve(t[key](value)); });
    return { done: false, value: new _OverloadYield(value, 1) };
  }
  e[typeof Symbol != "undefined" && Symbol.iterator || "@@iterator"] = function () { return this; };
  e.next = function (v) {
    if (waiting) { waiting = false; return v; }
    return pump("next", v);
  };
  if (typeof t.throw == "function") {
    e.throw = function (v) {
      if (waiting) { waiting = false; throw v; }
      return pump("throw", v);
    };
  }
  if (typeof t.return == "function") {
    e.return = function (v) {
      if (waiting) { waiting = false; return v; }
      return pump("return", v);
    };
  }
  return e;
}"#,
    },
    Helper {
        name: "checkPrivateRedeclaration",
        deps: &[],
        source: r#"function _checkPrivateRedeclaration(e, t) {
  if (t.has(e)) throw new TypeError("Cannot initialize the same private elements twice on an object");
}"#,
    },
    Helper {
        name: "classPrivateFieldInitSpec",
        deps: &["checkPrivateRedeclaration"],
        source: r#"function _classPrivateFieldInitSpec(e, t, a) {
  _checkPrivateRedeclaration(e, t);
  t.set(e, a);
}"#,
    },
    Helper {
        name: "classPrivateMethodInitSpec",
        deps: &["checkPrivateRedeclaration"],
        source: r#"function _classPrivateMethodInitSpec(e, a) {
  _checkPrivateRedeclaration(e, a);
  a.add(e);
}"#,
    },
    Helper {
        name: "assertClassBrand",
        deps: &[],
        source: r#"function _assertClassBrand(e, t, n) {
  if (typeof e == "function" ? e === t : e.has(t)) return arguments.length < 3 ? t : n;
  throw new TypeError("Private element is not present on this object");
}"#,
    },
    Helper {
        name: "classPrivateFieldGet2",
        deps: &["assertClassBrand"],
        source: r#"function _classPrivateFieldGet2(s, a) {
  return s.get(_assertClassBrand(s, a));
}"#,
    },
    Helper {
        name: "classPrivateFieldSet2",
        deps: &["assertClassBrand"],
        source: r#"function _classPrivateFieldSet2(s, a, r) {
  s.set(_assertClassBrand(s, a), r);
  return r;
}"#,
    },
    Helper {
        name: "toSetter",
        deps: &[],
        source: r#"function _toSetter(t, e, n) {
  if (!e) e = [];
  var r = e.length++;
  return Object.defineProperty({}, "_", { set: function (o) { e[r] = o; t.apply(n, e); } });
}"#,
    },
    Helper {
        name: "checkInRHS",
        deps: &[],
        source: r#"function _checkInRHS(e) {
  if (Object(e) !== e) {
    throw new TypeError("right-hand side of 'in' should be an object, got " + (e !== null ? typeof e : "null"));
  }
  return e;
}"#,
    },
    Helper {
        name: "superPropGet",
        deps: &[],
        source: r#"function _superPropGet(t, o, e, r) {
  var p = Reflect.get(Object.getPrototypeOf(r & 1 ? t.prototype : t), o, e);
  return r & 2 && typeof p == "function" ? function (a) { return p.apply(e, a); } : p;
}"#,
    },
    Helper {
        name: "superPropSet",
        deps: &[],
        source: r#"function _superPropSet(t, e, o, r, p, f) {
  if (!Reflect.set(Object.getPrototypeOf(f ? t.prototype : t), e, o, r) && p) {
    throw new TypeError("failed to set property");
  }
  return o;
}"#,
    },
    Helper {
        name: "readOnlyError",
        deps: &[],
        source: r#"function _readOnlyError(r) {
  throw new TypeError('"' + r + '" is read-only');
}"#,
    },
    Helper {
        name: "writeOnlyError",
        deps: &[],
        source: r#"function _writeOnlyError(r) {
  throw new TypeError('"' + r + '" is write-only');
}"#,
    },
];

fn lookup(name: &str) -> Option<&'static Helper> {
    HELPERS.iter().find(|h| h.name == name)
}

/// Helper names `code` calls through the helpers object, sorted.
pub fn referenced(code: &str) -> BTreeSet<String> {
    HELPER_REF
        .captures_iter(code)
        .map(|c| c[1].to_string())
        .collect()
}

/// Prepend the definitions `code` needs. Returns the name of the first
/// helper there is no definition for.
pub fn with_helpers(code: String) -> Result<String, String> {
    let used = referenced(&code);
    if used.is_empty() {
        return Ok(code);
    }

    let mut included = BTreeSet::new();
    let mut pending: Vec<String> = used.iter().cloned().collect();
    while let Some(name) = pending.pop() {
        let helper = lookup(&name).ok_or_else(|| name.clone())?;
        if included.insert(helper.name) {
            pending.extend(helper.deps.iter().map(|d| d.to_string()));
        }
    }

    let mut preamble = format!("var {HELPERS_OBJECT} = (function () {{\n");
    // table order keeps the preamble stable across runs
    for helper in HELPERS.iter().filter(|h| included.contains(h.name)) {
        preamble.push_str(helper.source);
        preamble.push('\n');
    }
    let members: Vec<String> = used
        .iter()
        .map(|name| format!("{}: _{name}", serde_json::Value::String(name.clone())))
        .collect();
    preamble.push_str(&format!("return {{ {} }};\n}})();\n", members.join(", ")));

    Ok(preamble + &code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_helpers_untouched() {
        let code = "console.log(1);\n".to_string();
        assert_eq!(with_helpers(code.clone()).unwrap(), code);
    }

    #[test]
    fn test_dependencies_pulled_in() {
        let out = with_helpers("const b = babelHelpers.objectSpread2({}, a);".into()).unwrap();
        assert!(out.starts_with("var babelHelpers = (function () {"));
        for name in ["_objectSpread2", "_ownKeys", "_defineProperty", "_toPropertyKey", "_toPrimitive"] {
            assert!(out.contains(&format!("function {name}(")), "{name} missing");
        }
        assert!(out.contains("return { \"objectSpread2\": _objectSpread2 };"));
        assert!(!out.contains("_asyncToGenerator"));
    }

    #[test]
    fn test_unknown_helper_reported() {
        let err = with_helpers("babelHelpers.usingCtx();".into()).unwrap_err();
        assert_eq!(err, "usingCtx");
    }

    #[test]
    fn test_every_dependency_defined() {
        for helper in HELPERS {
            for dep in helper.deps {
                assert!(lookup(dep).is_some(), "{} needs {dep}", helper.name);
            }
            assert!(helper.source.contains(&format!("function _{}(", helper.name)));
        }
    }
}
