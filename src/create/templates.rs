// Stock bodies for a new S2I builder image project.
// Placeholders use handlebars syntax; `\{{` emits a literal `{{`.

pub static DOCKERFILE: &str = r#"# {{image_name}}
FROM registry.access.redhat.com/ubi9/python-311

LABEL maintainer="Your Name <your@email.com>"

ENV BUILDER_VERSION=1.0

LABEL io.k8s.description="Platform for building {{image_name}} applications" \
      io.k8s.display-name="{{image_name}} builder 1.0" \
      io.openshift.expose-services="8080:http" \
      io.openshift.tags="builder,{{image_name}}" \
      io.openshift.s2i.scripts-url="image:///usr/libexec/s2i"

# Install any extra build or runtime packages here, e.g.
# RUN dnf install -y --setopt=tsflags=nodocs <packages> && dnf clean all -y

COPY ./s2i/bin/ /usr/libexec/s2i

USER 1001

EXPOSE 8080

CMD ["/usr/libexec/s2i/usage"]
"#;

pub static README: &str = r#"# {{image_name}}

Source-to-image builder image for `{{image_name}}`.

## Layout

* `Dockerfile` defines the builder image.
* `s2i/bin/assemble` builds the application from source inside the builder.
* `s2i/bin/run` starts the built application.
* `s2i/bin/usage` prints how to use the image.
* `s2i/bin/save-artifacts` streams reusable build artifacts for incremental builds.
* `test/run` builds a sample application with the image and checks it answers on port 8080.
* `test/test-app/` is the sample application used by `test/run`.

## Usage

    make build
    make test
    s2i build <source> {{image_name}} <application-image>
"#;

pub static ASSEMBLE_SCRIPT: &str = r#"#!/bin/bash -e
#
# S2I assemble script for the '{{image_name}}' image.
# The 'assemble' script builds your application source so that it is ready to run.
#
# For more information refer to the documentation:
#	https://github.com/openshift/source-to-image/blob/master/docs/builder_image.md
#

# If the '{{image_name}}' assemble script is executed with the '-h' flag, print the usage.
if [[ "$1" == "-h" ]]; then
	exec /usr/libexec/s2i/usage
fi

# Restore artifacts from the previous build (if they exist).
if [ "$(ls /tmp/artifacts/ 2>/dev/null)" ]; then
  echo "---> Restoring build artifacts..."
  cp -Rf /tmp/artifacts/. ./
fi

echo "---> Installing application source..."
cp -Rf /tmp/src/. ./

echo "---> Building application from source..."
# Add build steps for your application here, e.g. dependency installation.
"#;

pub static RUN_SCRIPT: &str = r#"#!/bin/bash -e
#
# S2I run script for the '{{image_name}}' image.
# The run script executes the server that runs your application.
#
# For more information see the documentation:
#	https://github.com/openshift/source-to-image/blob/master/docs/builder_image.md
#

exec python3 -m http.server 8080
"#;

pub static USAGE_SCRIPT: &str = r#"#!/bin/bash -e
cat <<EOF
This is the {{image_name}} S2I image:
To use it, install S2I: https://github.com/openshift/source-to-image

Sample invocation:

s2i build <source code path/URL> {{image_name}} <application image>

You can then run the resulting image via:
docker run <application image>
EOF
"#;

pub static SAVE_ARTIFACTS_SCRIPT: &str = r#"#!/bin/sh -e
#
# S2I save-artifacts script for the '{{image_name}}' image.
# The save-artifacts script streams a tar archive to standard output.
# The archive contains the files and folders you want to re-use in the next build.
#
# For more information see the documentation:
#	https://github.com/openshift/source-to-image/blob/master/docs/builder_image.md
#
# List the files and folders to keep between builds, e.g.
# tar cf - .cache

tar cf - --files-from /dev/null
"#;

pub static TEST_RUN_SCRIPT: &str = r#"#!/bin/bash
#
# The 'run' performs a simple test that verifies the S2I image.
# The main focus here is to exercise the S2I scripts.
#
# For more information see the documentation:
# https://github.com/openshift/source-to-image/blob/master/docs/builder_image.md
#
# IMAGE_NAME specifies a name of the candidate image used for testing.
# The image has to be available before this script is executed.
#
IMAGE_NAME=${IMAGE_NAME-{{image_name}}-candidate}

if [[ ! -z "$(echo $DOCKER_HOST | grep podman)" || ! -z "${FORCE_PODMAN}" ]]
then
  HAS_PODMAN=true
  IMAGE_PREFIX="localhost/"
  DOCKER_BINARY=podman
else
  HAS_PODMAN=false
  DOCKER_BINARY=docker
fi

# Determining system utility executables (darwin compatibility check)
READLINK_EXEC="readlink -zf"
MKTEMP_EXEC="mktemp --suffix=.cid"
if [[ "$OSTYPE" =~ 'darwin' ]]; then
  READLINK_EXEC="readlink"
  MKTEMP_EXEC="mktemp"
  ! type -a "greadlink" &>"/dev/null" || READLINK_EXEC="greadlink"
  ! type -a "gmktemp" &>"/dev/null" || MKTEMP_EXEC="gmktemp"
fi

_dir="$(dirname "${BASH_SOURCE[0]}")"
test_dir="$($READLINK_EXEC ${_dir} || echo ${_dir})"
image_dir=$($READLINK_EXEC ${test_dir}/.. || echo ${test_dir}/..)
scripts_url="${image_dir}/s2i/bin"
cid_file=$($MKTEMP_EXEC -u)

# The candidate image was built locally, S2I must not try to pull it
s2i_args="--pull-policy=never --loglevel=2"

# Port the image exposes service to be tested
test_port=8080

image_exists() {
  $DOCKER_BINARY inspect $1 &>/dev/null
}

container_exists() {
  image_exists $(cat $cid_file)
}

container_ip() {
  if [[ "${HAS_PODMAN}" == "true" ]]
  then
    ip=$(podman inspect --format="\{{(index .HostConfig.PortBindings \"$test_port/tcp\" 0).HostIp }}" $(cat $cid_file) 2>/dev/null | sed 's/0.0.0.0/localhost/')
    [[ -z "${ip}" ]] && echo "localhost" || echo "${ip}"
  else
    docker inspect --format="\{{(index .NetworkSettings.Ports \"$test_port/tcp\" 0).HostIp }}" $(cat $cid_file) | sed 's/0.0.0.0/localhost/'
  fi
}

container_port() {
  if [[ "${HAS_PODMAN}" == "true" ]]
  then
    podman inspect --format="\{{(index .HostConfig.PortBindings \"$test_port/tcp\" 0).HostPort }}" "$(cat "${cid_file}")"
  else
    docker inspect --format="\{{(index .NetworkSettings.Ports \"$test_port/tcp\" 0).HostPort }}" "$(cat "${cid_file}")"
  fi
}

run_s2i_build() {
  if [[ "${HAS_PODMAN}" == "true" ]]
  then
    CONTAINER_FOLDER=$(mktemp -d)
    s2i build --incremental=true ${s2i_args} "${test_dir}"/test-app ${IMAGE_PREFIX}${IMAGE_NAME} ${IMAGE_PREFIX}${IMAGE_NAME} --as-dockerfile "$CONTAINER_FOLDER"/Containerfile
    podman build -t ${IMAGE_PREFIX}${IMAGE_NAME}-testapp -f $CONTAINER_FOLDER/Containerfile $CONTAINER_FOLDER
    rm -fr "$CONTAINER_FOLDER"
  else
    s2i build --incremental=true ${s2i_args} ${test_dir}/test-app ${IMAGE_NAME} ${IMAGE_NAME}-testapp
  fi
}

prepare() {
  if ! image_exists ${IMAGE_PREFIX}${IMAGE_NAME}; then
    echo "ERROR: The image ${IMAGE_PREFIX}${IMAGE_NAME} must exist before this script is executed."
    exit 1
  fi
  # s2i build requires the application is a valid 'Git' repository
  pushd ${test_dir}/test-app >/dev/null
  git init
  git config user.email "build@localhost" && git config user.name "builder"
  git add -A && git commit -m "Sample commit"
  popd >/dev/null
  run_s2i_build
}

run_test_application() {
  $DOCKER_BINARY run --rm --cidfile=${cid_file} -p ${test_port}:${test_port} ${IMAGE_PREFIX}${IMAGE_NAME}-testapp
}

cleanup() {
  if [ -f $cid_file ]; then
    if container_exists; then
      $DOCKER_BINARY stop $(cat $cid_file)
    fi
  fi
  if image_exists ${IMAGE_PREFIX}${IMAGE_NAME}-testapp; then
    $DOCKER_BINARY rmi ${IMAGE_PREFIX}${IMAGE_NAME}-testapp
  fi
}

check_result() {
  local result="$1"
  if [[ "$result" != "0" ]]; then
    echo "S2I image '${IMAGE_NAME}' test FAILED (exit code: ${result})"
    cleanup
    exit $result
  fi
}

wait_for_cid() {
  local max_attempts=10
  local sleep_time=1
  local attempt=1
  while [ $attempt -le $max_attempts ]; do
    [ -f $cid_file ] && break
    echo "Waiting for container to start..."
    attempt=$(( $attempt + 1 ))
    sleep $sleep_time
  done
}

test_usage() {
  echo "Testing 's2i usage'..."
  s2i usage ${s2i_args} ${IMAGE_PREFIX}${IMAGE_NAME} &>/dev/null
}

test_connection() {
  echo "Testing HTTP connection (http://$(container_ip):$(container_port))"
  local max_attempts=10
  local sleep_time=1
  local attempt=1
  local result=1
  while [ $attempt -le $max_attempts ]; do
    echo "Sending GET request to http://$(container_ip):$(container_port)/"
    response_code=$(curl -s -w %{http_code} -o /dev/null http://$(container_ip):$(container_port)/)
    status=$?
    if [ $status -eq 0 ]; then
      if [ $response_code -eq 200 ]; then
        result=0
      fi
      break
    fi
    attempt=$(( $attempt + 1 ))
    sleep $sleep_time
  done
  return $result
}

# Build the application image twice to ensure the 'save-artifacts' and
# 'restore-artifacts' scripts are working properly
prepare
run_s2i_build
check_result $?

# Verify the 'usage' script is working properly
test_usage
check_result $?

# Verify that the HTTP connection can be established to test application container
run_test_application &

# Wait for the container to write its CID file
wait_for_cid

test_connection
check_result $?

cleanup
"#;

// Recipe lines need real tabs.
pub static MAKEFILE: &str = "IMAGE_NAME = {{image_name}}
DOCKER_BINARY = $(shell /bin/bash -c 'which podman docker | head -1' )

.PHONY: build
build:
\t$(DOCKER_BINARY) build -t $(IMAGE_NAME) .

.PHONY: test
test:
\t$(DOCKER_BINARY) build -t $(IMAGE_NAME)-candidate .
\tIMAGE_NAME=$(IMAGE_NAME)-candidate test/run
";

pub static INDEX_HTML: &str = r#"<!doctype html>
<html>
	<head>
		<title>Hello World!</title>
	</head>
	<body>
		<h1>Hello World!</h1>
		<p>Served by the {{image_name}} test application.</p>
	</body>
</html>
"#;
