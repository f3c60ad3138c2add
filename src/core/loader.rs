//! Runtime loader protocol
//!
//! Every emitted payload and chunk talks to one runtime object stored under
//! [`PROTOCOL_GLOBAL`]. The shim installs that object only when the global is
//! still unset, so several copies of the shim on one page share one registry.

/// Reserved global holding the runtime loader
pub const PROTOCOL_GLOBAL: &str = "__auto_import_protocol_v1__";

const SHIM_BODY: &str = r#"(function (global) {
  if (global[PROTOCOL]) {
    return;
  }
  var own = Object.prototype.hasOwnProperty;
  var factories = {};
  var instances = {};
  var scopes = {};
  var aliases = {};
  var chunks = {};
  var inflight = {};

  function resolveId(specifier, scope) {
    var table = scope && scopes[scope];
    if (table && own.call(table, specifier)) {
      return table[specifier];
    }
    return own.call(aliases, specifier) ? aliases[specifier] : undefined;
  }

  function instantiate(id) {
    if (!own.call(instances, id)) {
      var module = { exports: {} };
      instances[id] = module.exports;
      factories[id](module, module.exports, protocol);
      instances[id] = module.exports;
    }
    return instances[id];
  }

  function fetchChunk(id) {
    var url = chunks[id];
    if (!own.call(inflight, url)) {
      inflight[url] = new Promise(function (resolve, reject) {
        if (typeof document === 'undefined') {
          reject(new Error('auto-import: cannot load ' + url + ' without a document'));
          return;
        }
        var script = document.createElement('script');
        script.src = url;
        script.async = true;
        script.onload = resolve;
        script.onerror = function () {
          delete inflight[url];
          reject(new Error('auto-import: failed to load ' + url));
        };
        document.head.appendChild(script);
      });
    }
    return inflight[url].then(function () {
      if (!own.call(factories, id)) {
        throw new Error('auto-import: ' + url + ' did not define ' + id);
      }
      return instantiate(id);
    });
  }

  var protocol = {
    define: function (id, factory) {
      if (!own.call(factories, id)) {
        factories[id] = factory;
      }
    },
    scope: function (pkg, specifier, id) {
      if (!own.call(scopes, pkg)) {
        scopes[pkg] = {};
      }
      scopes[pkg][specifier] = id;
    },
    alias: function (specifier, id) {
      if (!own.call(aliases, specifier)) {
        aliases[specifier] = id;
      }
    },
    chunk: function (id, url) {
      if (!own.call(factories, id)) {
        chunks[id] = url;
      }
    },
    has: function (specifier, scope) {
      var id = resolveId(specifier, scope);
      return id !== undefined && (own.call(factories, id) || own.call(chunks, id));
    },
    load: function (specifier, scope) {
      var id = resolveId(specifier, scope);
      if (id !== undefined && own.call(chunks, id)) {
        return fetchChunk(id);
      }
      if (id !== undefined && own.call(factories, id)) {
        return instantiate(id);
      }
      throw new Error("auto-import: unknown module '" + specifier + "'");
    }
  };

  global[PROTOCOL] = protocol;
})(typeof globalThis !== 'undefined' ? globalThis : this);
"#;

/// The loader shim, emitted once per build and copied next to every bundle
pub fn loader_shim() -> String {
    SHIM_BODY.replace("PROTOCOL", &js_string(PROTOCOL_GLOBAL))
}

/// Wrap code so it runs with the protocol object bound to `loader`
pub fn wrap_payload(body: &str) -> String {
    format!(
        "(function (loader) {{\n{}\n}})(globalThis[{}]);\n",
        body.trim_end(),
        js_string(PROTOCOL_GLOBAL)
    )
}

/// Quote a value as a JavaScript string literal
pub fn js_string(value: &str) -> String {
    // JSON strings are valid JS string literals; the two line separators
    // are escaped for pre-ES2019 engines
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Registration calls appended to an eager payload
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registration {
    lines: Vec<String>,
}

impl Registration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `specifier` resolve to `id` for code in `package`
    pub fn scope(&mut self, package: &str, specifier: &str, id: &str) -> &mut Self {
        self.lines.push(format!(
            "loader.scope({}, {}, {});",
            js_string(package),
            js_string(specifier),
            js_string(id)
        ));
        self
    }

    /// Make `specifier` resolve to `id` when no scope applies
    pub fn alias(&mut self, specifier: &str, id: &str) -> &mut Self {
        self.lines.push(format!(
            "loader.alias({}, {});",
            js_string(specifier),
            js_string(id)
        ));
        self
    }

    /// Tell the runtime where the chunk defining `id` lives
    pub fn chunk(&mut self, id: &str, url: &str) -> &mut Self {
        self.lines
            .push(format!("loader.chunk({}, {});", js_string(id), js_string(url)));
        self
    }

    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}
